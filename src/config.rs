use std::env;

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
}

impl Config {
  pub fn from_env() -> Self {
    Self {
      database_url: env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:queue.db".into()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn falls_back_to_local_database_file() {
    let config = Config::from_env();
    if env::var("DATABASE_URL").is_err() {
      assert_eq!(config.database_url, "sqlite:queue.db");
    }
  }
}
