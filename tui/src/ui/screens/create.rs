use crossterm::event::KeyCode;
use orchestrator::configs::{PeerDraft, SessionDraft};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::{theme::Theme, widgets};

const MAX_PEERS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerField {
    LearningRate,
    BatchSize,
    Epochs,
    Optimizer,
    WeightDecay,
    Dropout,
    HiddenLayers,
}

const PEER_FIELDS: [PeerField; 7] = [
    PeerField::LearningRate,
    PeerField::BatchSize,
    PeerField::Epochs,
    PeerField::Optimizer,
    PeerField::WeightDecay,
    PeerField::Dropout,
    PeerField::HiddenLayers,
];

impl PeerField {
    fn label(self) -> &'static str {
        match self {
            Self::LearningRate => "learning rate",
            Self::BatchSize => "batch size",
            Self::Epochs => "epochs",
            Self::Optimizer => "optimizer",
            Self::WeightDecay => "weight decay",
            Self::Dropout => "dropout",
            Self::HiddenLayers => "hidden layers",
        }
    }

    fn value(self, peer: &PeerDraft) -> &str {
        match self {
            Self::LearningRate => &peer.learning_rate,
            Self::BatchSize => &peer.batch_size,
            Self::Epochs => &peer.epochs,
            Self::Optimizer => &peer.optimizer,
            Self::WeightDecay => &peer.weight_decay,
            Self::Dropout => &peer.dropout,
            Self::HiddenLayers => &peer.hidden_layers,
        }
    }

    fn value_mut(self, peer: &mut PeerDraft) -> &mut String {
        match self {
            Self::LearningRate => &mut peer.learning_rate,
            Self::BatchSize => &mut peer.batch_size,
            Self::Epochs => &mut peer.epochs,
            Self::Optimizer => &mut peer.optimizer,
            Self::WeightDecay => &mut peer.weight_decay,
            Self::Dropout => &mut peer.dropout,
            Self::HiddenLayers => &mut peer.hidden_layers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    NumPeers,
    Dataset,
    Peer(usize, PeerField),
}

/// What the session tab should do after a key reached the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    None,
    Submit,
    Back,
}

/// The editable new-session form.
pub struct CreateForm {
    pub draft: SessionDraft,
    num_peers: String,
    focus: usize,
}

impl CreateForm {
    pub fn new() -> Self {
        let draft = SessionDraft::default();
        Self {
            num_peers: draft.num_peers().to_string(),
            draft,
            focus: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> FormOutcome {
        match key {
            KeyCode::Enter => return FormOutcome::Submit,
            KeyCode::Esc => return FormOutcome::Back,
            KeyCode::Up | KeyCode::BackTab => self.focus = self.focus.saturating_sub(1),
            KeyCode::Down | KeyCode::Tab => {
                self.focus = (self.focus + 1).min(self.field_count() - 1);
            }
            KeyCode::Char(c) => {
                let field = self.field(self.focus);
                if field == Field::NumPeers && !c.is_ascii_digit() {
                    return FormOutcome::None;
                }
                if let Some(value) = self.value_mut(field) {
                    value.push(c);
                }
                if field == Field::NumPeers {
                    self.sync_num_peers();
                }
            }
            KeyCode::Backspace => {
                let field = self.field(self.focus);
                if let Some(value) = self.value_mut(field) {
                    value.pop();
                }
                if field == Field::NumPeers {
                    self.sync_num_peers();
                }
            }
            _ => {}
        }

        FormOutcome::None
    }

    fn field_count(&self) -> usize {
        2 + self.draft.num_peers() * PEER_FIELDS.len()
    }

    fn field(&self, idx: usize) -> Field {
        match idx {
            0 => Field::NumPeers,
            1 => Field::Dataset,
            n => {
                let n = n - 2;
                Field::Peer(n / PEER_FIELDS.len(), PEER_FIELDS[n % PEER_FIELDS.len()])
            }
        }
    }

    fn value_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::NumPeers => Some(&mut self.num_peers),
            Field::Dataset => Some(&mut self.draft.dataset_path),
            Field::Peer(i, f) => self.draft.peer_mut(i).map(|p| f.value_mut(p)),
        }
    }

    /// Resizes the peer list once the typed count is a valid one.
    fn sync_num_peers(&mut self) {
        match self.num_peers.parse::<usize>() {
            Ok(n) if n > 0 => {
                let n = n.min(MAX_PEERS);
                self.num_peers = n.to_string();
                self.draft.set_num_peers(n);
                self.focus = self.focus.min(self.field_count() - 1);
            }
            _ => {}
        }
    }
}

pub fn draw(f: &mut Frame, area: Rect, form: &CreateForm) {
    let mut lines = Vec::new();
    let mut focus_line = 0;

    let mut push = |lines: &mut Vec<Line<'static>>, idx: usize, label: String, value: String| {
        let focused = idx == form.focus;
        if focused {
            focus_line = lines.len();
        }

        let (marker, style) = if focused {
            ("▶ ", Theme::title())
        } else {
            ("  ", Theme::dim())
        };
        let cursor = if focused { "▏" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(marker, style),
            Span::styled(format!("{label:<16}"), style),
            Span::styled(value, Theme::text()),
            Span::styled(cursor, Theme::title()),
        ]));
    };

    push(&mut lines, 0, "peers".into(), form.num_peers.clone());
    push(&mut lines, 1, "dataset file".into(), form.draft.dataset_path.clone());

    for (i, peer) in form.draft.peers().iter().enumerate() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("  Peer {}", i + 1),
            Theme::accent_cyan(),
        )));

        for (j, field) in PEER_FIELDS.iter().enumerate() {
            let idx = 2 + i * PEER_FIELDS.len() + j;
            push(
                &mut lines,
                idx,
                format!("  {}", field.label()),
                field.value(peer).to_string(),
            );
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "  only learning rate, batch size and epochs are sent to the peers",
        Theme::muted(),
    )));

    let block = widgets::panel("New session").border_style(Theme::border_focus());
    let height = block.inner(area).height as usize;
    let scroll = (focus_line + 1).saturating_sub(height);

    f.render_widget(
        Paragraph::new(lines).block(block).scroll((scroll as u16, 0)),
        area,
    );
}
