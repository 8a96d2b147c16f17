use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("could not login to the remote server: {0}")]
    Login(String),

    #[error("remote server error: {0}")]
    Remote(String),

    #[error("could not determine the location of Softaculous on the remote server, a firewall may be blocking access")]
    SoftaculousNotLocated,

    #[error("could not download list of scripts: {0}")]
    CatalogUnavailable(String),

    #[error("could not determine the script to be installed, check the script name: {0}")]
    ScriptNotFound(String),

    #[error("could not install script: {0}")]
    InstallRejected(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<url::ParseError> for InstallError {
    fn from(e: url::ParseError) -> Self {
        InstallError::InvalidUrl(e.to_string())
    }
}
