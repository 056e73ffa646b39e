use api::{Dataset, StartSession, types::Hyperparameters};

use crate::DashboardError;

/// Raw, user-edited hyperparameters of one peer.
///
/// Optimizer, weight decay, dropout and hidden layers are collected for the
/// form only, the backend receives learning rate, batch size and epochs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDraft {
    pub learning_rate: String,
    pub batch_size: String,
    pub epochs: String,
    pub optimizer: String,
    pub weight_decay: String,
    pub dropout: String,
    pub hidden_layers: String,
}

impl Default for PeerDraft {
    fn default() -> Self {
        Self {
            learning_rate: "0.001".into(),
            batch_size: "32".into(),
            epochs: "10".into(),
            optimizer: "Adam".into(),
            weight_decay: "0.001".into(),
            dropout: "0.3".into(),
            hidden_layers: "128, 64".into(),
        }
    }
}

impl PeerDraft {
    /// Parses the submitted fields.
    ///
    /// # Arguments
    /// * `idx` - Position of the peer, only used in error messages.
    fn parse(&self, idx: usize) -> Result<Hyperparameters, String> {
        let ctx = |field: &str, value: &str| format!("peer {}: invalid {field} '{value}'", idx + 1);

        let learning_rate = self
            .learning_rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|lr| lr.is_finite() && *lr > 0.0)
            .ok_or_else(|| ctx("learning rate", &self.learning_rate))?;

        let batch_size = self
            .batch_size
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ctx("batch size", &self.batch_size))?;

        let epochs = self
            .epochs
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ctx("epochs", &self.epochs))?;

        Ok(Hyperparameters {
            learning_rate,
            batch_size,
            epochs,
        })
    }
}

/// The state of the "create session" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub dataset_path: String,
    peers: Vec<PeerDraft>,
}

impl Default for SessionDraft {
    fn default() -> Self {
        let second = PeerDraft {
            learning_rate: "0.01".into(),
            batch_size: "64".into(),
            ..PeerDraft::default()
        };

        Self {
            dataset_path: String::new(),
            peers: vec![PeerDraft::default(), second],
        }
    }
}

impl SessionDraft {
    pub fn num_peers(&self) -> usize {
        self.peers.len()
    }

    pub fn peers(&self) -> &[PeerDraft] {
        &self.peers
    }

    pub fn peer_mut(&mut self, idx: usize) -> Option<&mut PeerDraft> {
        self.peers.get_mut(idx)
    }

    /// Resizes the per-peer list, keeping the entries that are already there.
    /// The count never drops below one.
    pub fn set_num_peers(&mut self, n: usize) {
        self.peers.resize_with(n.max(1), PeerDraft::default);
    }

    /// Parses every peer's submitted hyperparameters.
    ///
    /// # Errors
    /// Returns `InvalidForm` naming the first field that doesn't parse.
    pub fn hyperparameters(&self) -> Result<Vec<Hyperparameters>, DashboardError> {
        self.peers
            .iter()
            .enumerate()
            .map(|(i, p)| p.parse(i))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DashboardError::InvalidForm)
    }

    /// Builds the request using an already loaded dataset.
    ///
    /// # Errors
    /// Returns `InvalidForm` if any field is invalid.
    pub fn with_dataset(&self, dataset: Dataset) -> Result<StartSession, DashboardError> {
        let hyperparameters = self.hyperparameters()?;
        StartSession::new(self.num_peers(), dataset, hyperparameters)
            .map_err(|e| DashboardError::InvalidForm(e.to_string()))
    }

    /// Builds the request, reading the dataset from `dataset_path`.
    ///
    /// # Errors
    /// Returns `InvalidForm` if the dataset is missing or any field is invalid.
    pub fn to_request(&self) -> Result<StartSession, DashboardError> {
        let path = self.dataset_path.trim();
        if path.is_empty() {
            return Err(DashboardError::InvalidForm("choose a dataset file".into()));
        }

        let dataset = Dataset::load(path).map_err(|e| DashboardError::InvalidForm(e.to_string()))?;
        self.with_dataset(dataset)
    }
}
