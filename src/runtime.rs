//! Runtime wrapper for long-lived frontend sessions.
//!
//! G2P backends are not required to tolerate concurrent calls, so one worker
//! thread owns the frontend and every request is serialized through a
//! channel. `Runtime` is a cheap, cloneable handle to that worker; the worker
//! exits once the last handle is dropped.

use crate::config::RuntimeConfig;
use crate::error::{Result, TtsError};
use crate::g2p::G2pEngine;
use crate::pipeline::{KokoroFrontend, PreprocessOutput};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct RuntimeStatus {
    pub initialized: bool,
    pub voice_path: Option<PathBuf>,
    pub vocab_path: Option<PathBuf>,
    pub token_limit: Option<usize>,
}

enum RuntimeCommand {
    Init {
        config: RuntimeConfig,
        reply: mpsc::Sender<Result<()>>,
    },
    Install {
        frontend: Box<KokoroFrontend>,
        reply: mpsc::Sender<Result<()>>,
    },
    Preprocess {
        text: String,
        language: Option<String>,
        reply: mpsc::Sender<Result<PreprocessOutput>>,
    },
    PreprocessPhonemes {
        phonemes: String,
        language: Option<String>,
        reply: mpsc::Sender<Result<PreprocessOutput>>,
    },
    Status {
        reply: mpsc::Sender<RuntimeStatus>,
    },
    Reset {
        reply: mpsc::Sender<Result<()>>,
    },
}

struct RuntimeWorker {
    config: Option<RuntimeConfig>,
    frontend: Option<KokoroFrontend>,
}

impl RuntimeWorker {
    fn new() -> Self {
        Self {
            config: None,
            frontend: None,
        }
    }

    fn init(&mut self, config: RuntimeConfig) -> Result<()> {
        let g2p = G2pEngine::new().map_err(TtsError::G2p)?;
        let frontend = config.build_frontend(g2p)?;
        info!(voice = %config.voice_path.display(), "Runtime initialized");

        self.config = Some(config);
        self.frontend = Some(frontend);
        Ok(())
    }

    fn install(&mut self, frontend: KokoroFrontend) {
        self.config = None;
        self.frontend = Some(frontend);
    }

    fn frontend(&self) -> Result<&KokoroFrontend> {
        self.frontend
            .as_ref()
            .ok_or_else(|| TtsError::NotInitialized("call init first".to_string()))
    }

    fn reset(&mut self) {
        self.config = None;
        self.frontend = None;
    }

    fn status(&self) -> RuntimeStatus {
        let config = self.config.as_ref();
        RuntimeStatus {
            initialized: self.frontend.is_some(),
            voice_path: config.map(|cfg| cfg.voice_path.clone()),
            vocab_path: config.and_then(|cfg| cfg.vocab_path.clone()),
            token_limit: self.frontend.as_ref().map(KokoroFrontend::token_limit),
        }
    }

    fn handle(&mut self, command: RuntimeCommand) {
        match command {
            RuntimeCommand::Init { config, reply } => {
                let result = self.init(config);
                if let Err(err) = &result {
                    error!("Init failed: {err}");
                }
                let _ = reply.send(result);
            }
            RuntimeCommand::Install { frontend, reply } => {
                self.install(*frontend);
                let _ = reply.send(Ok(()));
            }
            RuntimeCommand::Preprocess {
                text,
                language,
                reply,
            } => {
                let result = self
                    .frontend()
                    .and_then(|frontend| frontend.preprocess(&text, language.as_deref()));
                let _ = reply.send(result);
            }
            RuntimeCommand::PreprocessPhonemes {
                phonemes,
                language,
                reply,
            } => {
                let result = self.frontend().and_then(|frontend| {
                    frontend.preprocess_phonemes(&phonemes, language.as_deref())
                });
                let _ = reply.send(result);
            }
            RuntimeCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            RuntimeCommand::Reset { reply } => {
                self.reset();
                let _ = reply.send(Ok(()));
            }
        }
    }
}

/// Handle to a frontend worker thread.
#[derive(Clone)]
pub struct Runtime {
    tx: mpsc::Sender<RuntimeCommand>,
}

impl Runtime {
    /// Start an empty worker; call `init` or `install` before preprocessing.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<RuntimeCommand>();
        thread::spawn(move || {
            let mut worker = RuntimeWorker::new();
            for command in rx {
                worker.handle(command);
            }
        });
        Self { tx }
    }

    fn request<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<T>) -> RuntimeCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(build(reply_tx))
            .map_err(|_| worker_stopped())?;
        reply_rx.recv().map_err(|_| worker_stopped())
    }

    /// Build the frontend from `config` on the worker thread.
    pub fn init(&self, config: RuntimeConfig) -> Result<()> {
        self.request(|reply| RuntimeCommand::Init { config, reply })?
    }

    /// Hand an already-built frontend to the worker.
    pub fn install(&self, frontend: KokoroFrontend) -> Result<()> {
        self.request(|reply| RuntimeCommand::Install {
            frontend: Box::new(frontend),
            reply,
        })?
    }

    pub fn preprocess(&self, text: &str, language: Option<&str>) -> Result<PreprocessOutput> {
        self.request(|reply| RuntimeCommand::Preprocess {
            text: text.to_string(),
            language: language.map(str::to_string),
            reply,
        })?
    }

    pub fn preprocess_phonemes(
        &self,
        phonemes: &str,
        language: Option<&str>,
    ) -> Result<PreprocessOutput> {
        self.request(|reply| RuntimeCommand::PreprocessPhonemes {
            phonemes: phonemes.to_string(),
            language: language.map(str::to_string),
            reply,
        })?
    }

    pub fn status(&self) -> Result<RuntimeStatus> {
        self.request(|reply| RuntimeCommand::Status { reply })
    }

    /// Drop the frontend; the worker keeps running.
    pub fn shutdown(&self) -> Result<()> {
        self.request(|reply| RuntimeCommand::Reset { reply })?
    }
}

fn worker_stopped() -> TtsError {
    TtsError::NotInitialized("runtime worker thread stopped".to_string())
}
