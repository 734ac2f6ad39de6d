use std::collections::HashMap;
use std::{env, fmt, io};

use heck::ToShoutySnakeCase;

/// TapeEnv allows us to mock environment variables while
/// running tests. Values inserted into the store shadow the
/// process environment, and under `cfg(test)` the process
/// environment is never read at all, so tests can run in parallel
/// without the local development environment leaking into them.
#[derive(Debug, Clone)]
pub struct TapeEnv {
    overrides: HashMap<String, String>,
    read_process_env: bool,
}

impl Default for TapeEnv {
    fn default() -> TapeEnv {
        TapeEnv::new()
    }
}

impl TapeEnv {
    /// creates a new environment variable store
    pub fn new() -> TapeEnv {
        TapeEnv {
            overrides: HashMap::new(),
            read_process_env: !cfg!(test),
        }
    }

    /// returns the value of the environment variable if it exists
    pub fn get(&self, key: TapeEnvKey) -> io::Result<Option<String>> {
        let key_str = key.to_string();
        tracing::trace!("Checking for ${}", &key_str);
        let result = match self.overrides.get(&key_str) {
            Some(value) => Some(value.clone()),
            None if self.read_process_env => match env::var(&key_str) {
                Ok(data) => Some(data),
                Err(env::VarError::NotPresent) => None,
                Err(env::VarError::NotUnicode(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!(
                            "The value of the environment variable \"{}\" is not valid Unicode.",
                            &key_str
                        ),
                    ))
                }
            },
            None => None,
        };

        match &result {
            Some(value) => tracing::debug!("read environment variable ${} = {}", &key_str, value),
            None => tracing::trace!("could not find ${}", &key_str),
        }

        Ok(result)
    }

    /// shadows an environment variable with a value
    pub fn insert(&mut self, key: TapeEnvKey, value: &str) {
        tracing::debug!("setting environment variable ${} = {}", key, value);
        self.overrides.insert(key.to_string(), value.to_string());
    }

    /// removes a shadowed value
    pub fn remove(&mut self, key: TapeEnvKey) {
        tracing::debug!("removing {}", key);
        self.overrides.remove(&key.to_string());
    }
}

/// TapeEnvKey defines all of the environment variables
/// that are respected by tape. Each environment variable is prefixed
/// with `TAPE_` and the suffix is the name of the key defined here,
/// converted from CamelCase to SHOUTY_SNAKE_CASE.
/// For example, `TapeEnvKey::FixturesDir.to_string()` becomes `TAPE_FIXTURES_DIR`
#[derive(Debug, Copy, Clone)]
pub enum TapeEnvKey {
    FixturesDir,
    Config,
}

impl fmt::Display for TapeEnvKey {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let dbg = format!("{:?}", self).to_shouty_snake_case();
        write!(fmt, "TAPE_{}", &dbg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_names_keys_with_the_tape_prefix() {
        assert_eq!(&TapeEnvKey::FixturesDir.to_string(), "TAPE_FIXTURES_DIR");
        assert_eq!(&TapeEnvKey::Config.to_string(), "TAPE_CONFIG");
    }

    #[test]
    fn it_can_set_and_read_from_mock() {
        let expected_value = "./recordings";
        let key = TapeEnvKey::FixturesDir;
        let mut env_store = TapeEnv::new();
        env_store.insert(key, expected_value);
        let actual_value = env_store.get(key).unwrap().unwrap();
        assert_eq!(expected_value, &actual_value)
    }

    #[test]
    fn it_can_remove_from_mock() {
        let key = TapeEnvKey::Config;
        let mut env_store = TapeEnv::new();
        env_store.insert(key, "tape.toml");
        env_store.remove(key);
        assert_eq!(env_store.get(key).unwrap(), None);
    }
}
