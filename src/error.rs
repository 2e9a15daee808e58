use std::path::PathBuf;

use thiserror::Error;

use crate::card_db::CardDbError;
use crate::config::ConfigError;
use crate::deck_list::DeckListError;
use crate::need::NeedError;
use crate::store::StoreError;

/// Every failure a deckwise operation can report to its caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("deck list error: {0}")]
    DeckList(#[from] DeckListError),
    #[error("{0}")]
    Need(#[from] NeedError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    CardDb(#[from] CardDbError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("json output error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no deck with id '{0}'")]
    DeckNotFound(String),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
