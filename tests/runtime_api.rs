use kokoro_frontend::constants::{STYLE_DIM, TOKEN_LIMIT};
use kokoro_frontend::{
    G2pBackend, G2pEngine, KokoroFrontend, LanguageCode, Runtime, TtsError, Vocab, VoicePack,
};
use ndarray::Array2;

struct EchoBackend;

impl G2pBackend for EchoBackend {
    fn phonemize(&self, text: &str, _language: LanguageCode) -> anyhow::Result<String> {
        Ok(text.to_string())
    }
}

fn frontend() -> KokoroFrontend {
    let data = Array2::<f32>::zeros((TOKEN_LIMIT + 1, STYLE_DIM));
    KokoroFrontend::new(
        Vocab::builtin(),
        G2pEngine::with_backend(Box::new(EchoBackend)),
        Box::new(VoicePack::from_array(data).unwrap()),
    )
}

#[test]
fn runtime_uninitialized_flow() {
    let runtime = Runtime::spawn();
    let current = runtime.status().expect("status call failed");
    assert!(!current.initialized);

    let err = runtime
        .preprocess("a", None)
        .expect_err("preprocess should fail before init");
    assert!(
        matches!(err, TtsError::NotInitialized(_)),
        "unexpected preprocess error: {err}"
    );

    runtime
        .shutdown()
        .expect("shutdown should succeed even if not initialized");
    let after = runtime.status().expect("status call failed");
    assert!(!after.initialized);
}

#[test]
fn runtime_serves_installed_frontend_across_handles() {
    let runtime = Runtime::spawn();
    runtime.install(frontend()).expect("install failed");

    let status = runtime.status().unwrap();
    assert!(status.initialized);
    assert_eq!(status.token_limit, Some(TOKEN_LIMIT));

    let other = runtime.clone();
    let worker = std::thread::spawn(move || other.preprocess("hello there", Some("en-gb")));
    let out = worker.join().unwrap().unwrap();
    assert_eq!(out.language.language, LanguageCode::EnGb);
    assert_eq!(out.chunks.len(), 1);

    let err = runtime.preprocess_phonemes("123", None).unwrap_err();
    assert!(matches!(err, TtsError::EmptyTokenization));

    runtime.shutdown().unwrap();
    assert!(!runtime.status().unwrap().initialized);
}

#[test]
fn runtime_init_reports_missing_voice_pack() {
    let runtime = Runtime::spawn();
    let config = kokoro_frontend::RuntimeConfig::new("/nonexistent/voice.npy");
    assert!(runtime.init(config).is_err());
    assert!(!runtime.status().unwrap().initialized);
}
