// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    compile: CompileLimits,
    batch: BatchLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct CompileLimits {
    max_spec_depth: usize,
    max_spec_fields: usize,
}

#[derive(serde::Deserialize)]
struct BatchLimits {
    max_worker_threads: usize,
    max_documents_per_batch: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PROJECTION_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=PROJECTION_CONFIG_DIR");

    let profile =
        env::var("PROJECTION_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("PROJECTION_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of exclusion_projection/
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig) {
    // Recursion in the compiler and in document projection is bounded by these
    const ABSOLUTE_MAX_SPEC_DEPTH: usize = 200;
    const ABSOLUTE_MAX_WORKER_THREADS: usize = 256;

    if config.compile.max_spec_depth == 0
        || config.compile.max_spec_depth > ABSOLUTE_MAX_SPEC_DEPTH
    {
        panic!(
            "compile.max_spec_depth must be in 1..={}, got {}",
            ABSOLUTE_MAX_SPEC_DEPTH, config.compile.max_spec_depth
        );
    }
    if config.compile.max_spec_fields == 0 {
        panic!("compile.max_spec_fields must be at least 1");
    }
    if config.batch.max_worker_threads == 0
        || config.batch.max_worker_threads > ABSOLUTE_MAX_WORKER_THREADS
    {
        panic!(
            "batch.max_worker_threads must be in 1..={}, got {}",
            ABSOLUTE_MAX_WORKER_THREADS, config.batch.max_worker_threads
        );
    }
    if config.logging.log_buffer_size == 0 {
        panic!("logging.log_buffer_size must be at least 1");
    }
    if config.logging.max_log_message_length < 64 {
        panic!("logging.max_log_message_length must be at least 64");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod compile {{
        pub const MAX_SPEC_DEPTH: usize = {};
        pub const MAX_SPEC_FIELDS: usize = {};
    }}

    pub mod batch {{
        pub const MAX_WORKER_THREADS: usize = {};
        pub const MAX_DOCUMENTS_PER_BATCH: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        config.compile.max_spec_depth,
        config.compile.max_spec_fields,
        config.batch.max_worker_threads,
        config.batch.max_documents_per_batch,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
