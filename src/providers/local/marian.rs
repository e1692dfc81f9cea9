use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::marian::{Config, MTModel};
use sentencepiece::SentencePieceProcessor;
use std::fs;
use std::path::PathBuf;

use super::{greedy_token, marian_config, ModelFiles, Vocab, WEIGHT_FILES};

/// One loaded opus-mt model with its source tokenizer.
pub(super) struct MarianTranslator {
    model: MTModel,
    config: Config,
    source: SentencePieceProcessor,
    vocab: Vocab,
    device: Device,
    max_len: usize,
}

impl MarianTranslator {
    pub(super) fn load(files: &ModelFiles) -> Result<Self> {
        let device = Device::Cpu;

        let raw = fs::read_to_string(&files.config)
            .with_context(|| format!("failed to read {}", files.config.display()))?;
        let config: Config = serde_json::from_value(marian_config(&raw)?)
            .with_context(|| format!("unsupported model config: {}", files.config.display()))?;
        let max_len = config.max_position_embeddings;

        let vb = if files.weights.extension().is_some_and(|ext| ext == "safetensors") {
            let tensors = candle_core::safetensors::load(&files.weights, &device)
                .with_context(|| format!("failed to load {}", files.weights.display()))?;
            VarBuilder::from_tensors(tensors, DType::F32, &device)
        } else {
            VarBuilder::from_pth(&files.weights, DType::F32, &device)
                .with_context(|| format!("failed to load {}", files.weights.display()))?
        };
        let model = MTModel::new(&config, vb).with_context(|| "failed to build MarianMT model")?;

        let source = SentencePieceProcessor::open(&files.source_spm).map_err(|err| {
            anyhow!("failed to open {}: {}", files.source_spm.display(), err)
        })?;
        let vocab_json = fs::read_to_string(&files.vocab)
            .with_context(|| format!("failed to read {}", files.vocab.display()))?;
        let vocab = Vocab::from_json(&vocab_json)?;

        Ok(Self {
            model,
            config,
            source,
            vocab,
            device,
            max_len,
        })
    }

    pub(super) fn translate(&mut self, text: &str) -> Result<String> {
        let pieces = self
            .source
            .encode(text)
            .map_err(|err| anyhow!("failed to tokenize input: {}", err))?;
        let ids = self.vocab.encode_pieces(
            pieces.iter().map(|piece| piece.piece.as_str()),
            self.config.eos_token_id,
            self.max_len,
        );

        self.model.reset_kv_cache();
        let input = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_xs = self.model.encoder().forward(&input, 0)?;

        let mut output = vec![self.config.decoder_start_token_id];
        for step in 0..self.max_len {
            let context = if step == 0 { output.len() } else { 1 };
            let start = output.len() - context;
            let input = Tensor::new(&output[start..], &self.device)?.unsqueeze(0)?;
            let logits = self.model.decode(&input, &encoder_xs, start)?.squeeze(0)?;
            let last = logits.get(logits.dim(0)? - 1)?.to_vec1::<f32>()?;
            let Some(token) = greedy_token(&last, self.config.pad_token_id) else {
                break;
            };
            if token == self.config.eos_token_id || token == self.config.forced_eos_token_id {
                break;
            }
            output.push(token);
        }
        Ok(self.vocab.decode(&output))
    }
}

/// Fetches (or reuses the cached copy of) a model from the Hugging Face hub.
pub(super) fn hub_files(model_id: &str) -> Result<ModelFiles> {
    let api = hf_hub::api::sync::Api::new().with_context(|| "failed to open Hugging Face cache")?;
    let repo = api.model(model_id.to_string());
    let fetch = |name: &str| -> Result<PathBuf> {
        repo.get(name)
            .with_context(|| format!("failed to fetch {} for {}", name, model_id))
    };

    let mut weights = None;
    for name in WEIGHT_FILES.iter().copied() {
        if let Ok(path) = fetch(name) {
            weights = Some(path);
            break;
        }
    }
    let weights = weights.ok_or_else(|| {
        anyhow!(
            "no model weights ({}) published for {}",
            WEIGHT_FILES.join(" or "),
            model_id
        )
    })?;

    Ok(ModelFiles {
        config: fetch("config.json")?,
        weights,
        source_spm: fetch("source.spm")?,
        vocab: fetch("vocab.json")?,
    })
}
