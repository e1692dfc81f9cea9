//! In-process MarianMT translation.
//!
//! Each language pair loads `config.json`, the weights (`model.safetensors` or
//! `pytorch_model.bin`), `source.spm` and `vocab.json` of its opus-mt model. Files come from
//! `<translation.model_dir>/<model id>` when a model directory is configured, otherwise from
//! the Hugging Face hub cache (downloaded on first use). Inference needs the `local` feature.

#[cfg(feature = "local")]
mod marian;

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
#[cfg(feature = "local")]
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{Provider, ProviderFuture, ProviderResponse, TranslationRequest};
use crate::languages::{model_id, DEFAULT_MODEL_FAMILY};

const WEIGHT_FILES: &[&str] = &["model.safetensors", "pytorch_model.bin"];
const EOS_PIECE: &str = "</s>";
const UNK_PIECE: &str = "<unk>";
const PAD_PIECE: &str = "<pad>";
const WORD_BOUNDARY: char = '\u{2581}';

#[derive(Clone)]
pub struct Local {
    model_family: String,
    model_dir: Option<PathBuf>,
    #[cfg(feature = "local")]
    models: Arc<Mutex<HashMap<String, marian::MarianTranslator>>>,
}

impl std::fmt::Debug for Local {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Local")
            .field("model_family", &self.model_family)
            .field("model_dir", &self.model_dir)
            .finish_non_exhaustive()
    }
}

impl Local {
    pub fn new(model_dir: Option<PathBuf>) -> Self {
        Self {
            model_family: DEFAULT_MODEL_FAMILY.to_string(),
            model_dir,
            #[cfg(feature = "local")]
            models: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_model_family(mut self, family: impl Into<String>) -> Self {
        let family = family.into();
        if !family.trim().is_empty() {
            self.model_family = family.trim().to_string();
        }
        self
    }

    fn model_files(&self, model_id: &str) -> Result<ModelFiles> {
        match self.model_dir.as_deref() {
            Some(dir) => ModelFiles::in_dir(&dir.join(model_id)),
            #[cfg(feature = "local")]
            None => marian::hub_files(model_id),
            #[cfg(not(feature = "local"))]
            None => Err(anyhow!(
                "no model directory configured for {} (set translation.model_dir)",
                model_id
            )),
        }
    }
}

impl Provider for Local {
    fn translate(self, request: TranslationRequest) -> ProviderFuture {
        Box::pin(async move {
            let model = model_id(&self.model_family, request.source, request.target);
            let task_model = model.clone();
            let translation =
                tokio::task::spawn_blocking(move || self.run(&task_model, &request.text))
                    .await
                    .with_context(|| "local translation task failed")??;
            Ok(ProviderResponse {
                translation,
                model: Some(model),
                usage: None,
            })
        })
    }
}

#[cfg(feature = "local")]
impl Local {
    fn run(&self, model_id: &str, text: &str) -> Result<String> {
        use std::collections::hash_map::Entry;

        let mut models = self
            .models
            .lock()
            .map_err(|_| anyhow!("local model cache lock poisoned"))?;
        let translator = match models.entry(model_id.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let files = self.model_files(model_id)?;
                tracing::info!("local: loading {} from {}", model_id, files.root().display());
                entry.insert(marian::MarianTranslator::load(&files)?)
            }
        };
        debug!("local: translating {} chars with {}", text.chars().count(), model_id);
        translator.translate(text)
    }
}

#[cfg(not(feature = "local"))]
impl Local {
    fn run(&self, model_id: &str, _text: &str) -> Result<String> {
        let files = self.model_files(model_id)?;
        debug!("local: found {} at {}", model_id, files.root().display());
        Err(anyhow!(
            "local translation with {} needs a build with `--features local`",
            model_id
        ))
    }
}

#[cfg_attr(not(feature = "local"), allow(dead_code))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModelFiles {
    pub(crate) config: PathBuf,
    pub(crate) weights: PathBuf,
    pub(crate) source_spm: PathBuf,
    pub(crate) vocab: PathBuf,
}

impl ModelFiles {
    fn in_dir(root: &Path) -> Result<Self> {
        let weights = WEIGHT_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                anyhow!(
                    "no model weights ({}) in {}",
                    WEIGHT_FILES.join(" or "),
                    root.display()
                )
            })?;
        let files = Self {
            config: root.join("config.json"),
            weights,
            source_spm: root.join("source.spm"),
            vocab: root.join("vocab.json"),
        };
        for path in [&files.config, &files.source_spm, &files.vocab] {
            if !path.is_file() {
                return Err(anyhow!("missing model file: {}", path.display()));
            }
        }
        Ok(files)
    }

    fn root(&self) -> &Path {
        self.config.parent().unwrap_or(Path::new("."))
    }
}

/// Piece/id table from `vocab.json`, shared by the encoder and decoder.
#[cfg_attr(not(feature = "local"), allow(dead_code))]
#[derive(Debug, Clone)]
pub(crate) struct Vocab {
    ids: HashMap<String, u32>,
    pieces: HashMap<u32, String>,
    unk: u32,
}

#[cfg_attr(not(feature = "local"), allow(dead_code))]
impl Vocab {
    pub(crate) fn from_json(content: &str) -> Result<Self> {
        let ids: HashMap<String, u32> =
            serde_json::from_str(content).with_context(|| "invalid vocab.json")?;
        let unk = *ids
            .get(UNK_PIECE)
            .ok_or_else(|| anyhow!("vocab.json has no {} entry", UNK_PIECE))?;
        let pieces = ids.iter().map(|(piece, id)| (*id, piece.clone())).collect();
        Ok(Self { ids, pieces, unk })
    }

    pub(crate) fn id(&self, piece: &str) -> u32 {
        self.ids.get(piece).copied().unwrap_or(self.unk)
    }

    /// Source ids for the encoder: truncated to `max_len` including the trailing `</s>`.
    pub(crate) fn encode_pieces<'a>(
        &self,
        pieces: impl IntoIterator<Item = &'a str>,
        eos: u32,
        max_len: usize,
    ) -> Vec<u32> {
        let mut ids = pieces
            .into_iter()
            .map(|piece| self.id(piece))
            .take(max_len.saturating_sub(1))
            .collect::<Vec<_>>();
        ids.push(eos);
        ids
    }

    /// Joins target pieces back into text, dropping special tokens.
    pub(crate) fn decode(&self, ids: &[u32]) -> String {
        let mut text = String::new();
        for id in ids {
            match self.pieces.get(id).map(String::as_str) {
                None | Some(EOS_PIECE) | Some(UNK_PIECE) | Some(PAD_PIECE) => {}
                Some(piece) => text.push_str(piece),
            }
        }
        text.replace(WORD_BOUNDARY, " ").trim().to_string()
    }
}

/// Fills the fields older opus-mt `config.json` files omit.
#[cfg_attr(not(feature = "local"), allow(dead_code))]
pub(crate) fn marian_config(content: &str) -> Result<Value> {
    let mut config: Map<String, Value> =
        serde_json::from_str(content).with_context(|| "invalid model config.json")?;
    let eos = config
        .get("eos_token_id")
        .cloned()
        .ok_or_else(|| anyhow!("model config.json has no eos_token_id"))?;
    let vocab_size = config.get("vocab_size").cloned().unwrap_or(Value::Null);
    let defaults = [
        ("use_cache", Value::Bool(true)),
        ("is_encoder_decoder", Value::Bool(true)),
        ("scale_embedding", Value::Bool(true)),
        ("share_encoder_decoder_embeddings", Value::Bool(true)),
        ("activation_function", Value::String("swish".to_string())),
        ("forced_eos_token_id", eos),
        ("decoder_vocab_size", vocab_size),
    ];
    for (key, value) in defaults {
        match config.get(key) {
            Some(existing) if !existing.is_null() => {}
            _ => {
                config.insert(key.to_string(), value);
            }
        }
    }
    Ok(Value::Object(config))
}

/// Greedy pick over one step of logits; `banned` (the pad id) is never chosen.
#[cfg_attr(not(feature = "local"), allow(dead_code))]
pub(crate) fn greedy_token(logits: &[f32], banned: u32) -> Option<u32> {
    logits
        .iter()
        .enumerate()
        .filter(|(index, score)| *index as u32 != banned && !score.is_nan())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(index, _)| index as u32)
}
