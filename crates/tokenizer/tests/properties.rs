//! End-to-end behavior of trained tokenizers.

use bytemerge_tokenizer::{
    AllowedSpecial, ModelFormat, SplitMode, Tokenizer, TokenizerError, GPT4_SPLIT_PATTERN,
};
use std::path::PathBuf;

const CORPUS: &str = "The quick brown fox jumps over the lazy dog. \
The dog sleeps; the fox doesn't. 12345 67890!\n\
Ünïcödé text: naïve café, 日本語のテキスト, emoji 👋🏽👋🏽 and tabs\tand  spaces.\r\n\
the the the quick quick brown brown";

fn trained(mode: SplitMode, vocab_size: usize) -> Tokenizer {
    let mut tokenizer = Tokenizer::builder()
        .vocab_size(vocab_size)
        .min_frequency(1)
        .split_mode(mode)
        .build()
        .unwrap();
    tokenizer.train(CORPUS).unwrap();
    tokenizer
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bytemerge_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_roundtrip_both_variants() {
    let samples = [
        "",
        "hello world",
        CORPUS,
        "unseen: Ωμέγα ∑ 🚀 \u{0}\u{7f} trailing   ",
    ];

    for mode in [SplitMode::Basic, SplitMode::gpt4(), SplitMode::gpt2()] {
        let tokenizer = trained(mode, 400);
        for text in samples {
            let ids = tokenizer.encode(text).unwrap();
            assert_eq!(tokenizer.decode(&ids).unwrap(), text);
        }
    }
}

#[test]
fn test_training_is_deterministic() {
    for mode in [SplitMode::Basic, SplitMode::gpt4()] {
        let first = trained(mode.clone(), 350);
        let second = trained(mode, 350);

        assert_eq!(first.merges(), second.merges());
        assert_eq!(first.vocab(), second.vocab());
    }
}

#[test]
fn test_parallel_count_gives_same_model() {
    let mut parallel = Tokenizer::builder()
        .vocab_size(350)
        .min_frequency(1)
        .parallel(true)
        .build()
        .unwrap();
    parallel.train(CORPUS).unwrap();

    assert_eq!(parallel.merges(), trained(SplitMode::gpt4(), 350).merges());
}

#[test]
fn test_earlier_merges_are_applied_first() {
    let tokenizer = Tokenizer::from_model_str("bytemerge v1\n\n0\n98 99\n97 98\n").unwrap();

    // (b,c) was learned first, so "abc" is [a, bc] and never [ab, c]
    assert_eq!(tokenizer.encode("abc").unwrap(), vec![97, 256]);
    assert_eq!(tokenizer.encode("ab").unwrap(), vec![257]);
}

#[test]
fn test_vocab_size_is_monotonic() {
    let mut previous = 256;
    for target in [256, 260, 300, 400, 5_000] {
        let tokenizer = trained(SplitMode::gpt4(), target);
        let size = tokenizer.vocab_size();

        assert_eq!(size, 256 + tokenizer.merges().len());
        assert!(size <= target);
        assert!(size >= previous);
        previous = size;
    }
    assert!(previous < 5_000, "tiny corpus cannot fill 5000 tokens");
}

#[test]
fn test_chunk_isolation() {
    let mut tokenizer = Tokenizer::builder()
        .vocab_size(300)
        .min_frequency(1)
        .split_mode(SplitMode::gpt4())
        .build()
        .unwrap();
    tokenizer.train("aaa bbb").unwrap();

    assert!(!tokenizer.merges().is_empty());
    for (_, token) in tokenizer.vocab().iter() {
        assert!(
            !(token.contains(&b'a') && token.contains(&b' ')),
            "token {:?} crosses a chunk boundary",
            String::from_utf8_lossy(token)
        );
    }
}

#[test]
fn test_golden_scenario() {
    let mut tokenizer = Tokenizer::builder()
        .vocab_size(259)
        .split_mode(SplitMode::Basic)
        .build()
        .unwrap();
    tokenizer.train("aaabdaaabac").unwrap();

    let merges: Vec<_> = tokenizer.merges().iter().collect();
    assert_eq!(
        merges,
        vec![((97, 97), 256), ((97, 98), 257), ((256, 257), 258)]
    );
    assert_eq!(tokenizer.encode("aaabdaaabac").unwrap(), vec![258, 100, 258, 97, 99]);
}

#[test]
fn test_special_token_precedence() {
    let mut tokenizer = trained(SplitMode::gpt4(), 320);
    tokenizer.register_special_tokens([("<END>", 50000)]).unwrap();

    let mut expected = tokenizer.encode_ordinary("hi").unwrap();
    expected.push(50000);
    expected.extend(tokenizer.encode_ordinary("there").unwrap());

    assert_eq!(tokenizer.encode("hi<END>there").unwrap(), expected);
    assert_eq!(
        tokenizer
            .encode_with_special("hi<END>there", &AllowedSpecial::None)
            .unwrap(),
        tokenizer.encode_ordinary("hi<END>there").unwrap()
    );
}

#[test]
fn test_decode_unknown_id() {
    let tokenizer = trained(SplitMode::Basic, 300);
    let unknown = tokenizer.vocab_size() as u32;

    assert!(matches!(
        tokenizer.decode(&[104, unknown]),
        Err(TokenizerError::UnknownTokenId(id)) if id == unknown
    ));
}

#[test]
fn test_save_load_idempotent() {
    let dir = temp_dir("persist");

    for mode in [SplitMode::Basic, SplitMode::gpt4()] {
        let mut tokenizer = trained(mode, 380);
        tokenizer
            .register_special_tokens([("<|endoftext|>", 100_257), ("<|fim prefix|>", 100_258)])
            .unwrap();

        for format in [ModelFormat::Json, ModelFormat::Text] {
            let prefix = format!("model_{format}");
            let model_path = tokenizer.save(&dir, &prefix, format).unwrap();
            assert!(dir.join(format!("{prefix}.vocab")).exists());

            let loaded = Tokenizer::load(&model_path).unwrap();
            assert_eq!(loaded.merges(), tokenizer.merges());
            assert_eq!(loaded.vocab(), tokenizer.vocab());
            assert_eq!(loaded.special_tokens(), tokenizer.special_tokens());
            assert_eq!(loaded.pattern(), tokenizer.pattern());

            // saving the loaded model again gives the same bytes
            let again = loaded.to_model_string(format).unwrap();
            assert_eq!(again, tokenizer.to_model_string(format).unwrap());
        }
    }

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_loaded_model_keeps_pattern() {
    let tokenizer = trained(SplitMode::gpt4(), 300);
    let content = tokenizer.to_model_string(ModelFormat::Text).unwrap();

    assert_eq!(content.lines().nth(1), Some(GPT4_SPLIT_PATTERN));
    let loaded = Tokenizer::from_model_str(&content).unwrap();
    assert_eq!(loaded.split_mode(), &SplitMode::gpt4());
}

#[test]
fn test_load_rejects_malformed_file() {
    let dir = temp_dir("malformed");
    let path = dir.join("broken.model");
    std::fs::write(&path, "bytemerge v1\n\n0\n97 98\n300 1\n").unwrap();

    assert!(matches!(
        Tokenizer::load(&path),
        Err(TokenizerError::MalformedModelFile(_))
    ));

    std::fs::remove_dir_all(dir).ok();
}
