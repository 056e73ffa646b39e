use std::{fs, path::Path};

use reqwest::multipart::{Form, Part};

use crate::{ApiError, Result, types::Hyperparameters};

/// A dataset file uploaded alongside a new session.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Dataset {
    /// Reads a dataset from disk.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the file cannot be read or is empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| ApiError::InvalidRequest(format!("cannot read '{}': {e}", path.display())))?;

        if bytes.is_empty() {
            return Err(ApiError::InvalidRequest(format!(
                "dataset '{}' is empty",
                path.display()
            )));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());

        Ok(Self { file_name, bytes })
    }
}

/// A validated request to start a new training session.
#[derive(Debug, Clone, PartialEq)]
pub struct StartSession {
    num_peers: usize,
    dataset: Dataset,
    hyperparameters: Vec<Hyperparameters>,
}

impl StartSession {
    /// Creates a new `StartSession`.
    ///
    /// # Arguments
    /// * `num_peers` - How many peers should train.
    /// * `dataset` - The dataset shared by every peer.
    /// * `hyperparameters` - One entry per peer.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if there are no peers or the hyperparameter
    /// count doesn't match `num_peers`.
    pub fn new(
        num_peers: usize,
        dataset: Dataset,
        hyperparameters: Vec<Hyperparameters>,
    ) -> Result<Self> {
        if num_peers == 0 {
            return Err(ApiError::InvalidRequest(
                "a session needs at least one peer".into(),
            ));
        }

        if hyperparameters.len() != num_peers {
            return Err(ApiError::InvalidRequest(format!(
                "expected {num_peers} hyperparameter entries, got {}",
                hyperparameters.len()
            )));
        }

        Ok(Self {
            num_peers,
            dataset,
            hyperparameters,
        })
    }

    pub fn num_peers(&self) -> usize {
        self.num_peers
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The JSON array sent in the `hyperparameters` field.
    pub fn hyperparameters_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.hyperparameters)?)
    }

    pub(crate) fn into_form(self) -> Result<Form> {
        let hyperparameters = self.hyperparameters_json()?;
        let file = Part::bytes(self.dataset.bytes).file_name(self.dataset.file_name);

        Ok(Form::new()
            .text("num_peers", self.num_peers.to_string())
            .part("file", file)
            .text("hyperparameters", hyperparameters))
    }
}
