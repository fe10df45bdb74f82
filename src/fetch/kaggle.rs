// src/fetch/kaggle.rs

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::{env, fs, path::PathBuf};
use tracing::debug;
use url::Url;

use super::http::BasicAuth;

const API_BASE: &str = "https://www.kaggle.com/api/v1/";

/// Shape of `~/.kaggle/kaggle.json`.
#[derive(Debug, Deserialize)]
struct KaggleJson {
    username: String,
    key: String,
}

/// Download URL of a single file of a Kaggle dataset.
pub fn file_url(owner: &str, dataset: &str, file: &str) -> Result<Url> {
    let base = Url::parse(API_BASE)?;
    let mut url = base.join("datasets/download/")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("cannot-be-a-base URL {}", base))?
        .pop_if_empty()
        .extend([owner, dataset, file]);
    Ok(url)
}

/// API credentials: `KAGGLE_USERNAME` + `KAGGLE_KEY`, else
/// `$KAGGLE_CONFIG_DIR/kaggle.json`, else `~/.kaggle/kaggle.json`.
pub fn credentials() -> Result<BasicAuth> {
    if let (Ok(username), Ok(password)) = (env::var("KAGGLE_USERNAME"), env::var("KAGGLE_KEY")) {
        debug!("using Kaggle credentials from environment");
        return Ok(BasicAuth { username, password });
    }

    let dir = match env::var("KAGGLE_CONFIG_DIR") {
        Ok(d) => PathBuf::from(d),
        Err(_) => PathBuf::from(env::var("HOME").context("HOME is not set")?).join(".kaggle"),
    };
    let path = dir.join("kaggle.json");
    let text = fs::read_to_string(&path)
        .with_context(|| format!("no Kaggle credentials in env and cannot read {:?}", path))?;
    credentials_from_json(&text).with_context(|| format!("parsing {:?}", path))
}

fn credentials_from_json(text: &str) -> Result<BasicAuth> {
    let k: KaggleJson = serde_json::from_str(text)?;
    Ok(BasicAuth {
        username: k.username,
        password: k.key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn builds_download_url() -> Result<()> {
        let url = file_url("justinas", "housing-in-london", "housing_in_london_yearly_variables.csv")?;
        assert_eq!(
            url.as_str(),
            "https://www.kaggle.com/api/v1/datasets/download/justinas/housing-in-london/housing_in_london_yearly_variables.csv"
        );
        Ok(())
    }

    #[test]
    fn escapes_path_segments() -> Result<()> {
        let url = file_url("me", "my set", "a b.csv")?;
        assert!(url.as_str().ends_with("/me/my%20set/a%20b.csv"));
        Ok(())
    }

    #[test]
    fn parses_kaggle_json() -> Result<()> {
        let auth = credentials_from_json(r#"{"username":"alice","key":"s3cret"}"#)?;
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.password, "s3cret");
        assert!(credentials_from_json("{}").is_err());
        Ok(())
    }
}
