pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# TARSPOOL CONFIGURATION
# =============================================================================
# Tarspool watches a source directory, waits for files to stop changing,
# groups them into fixed-size batches, and writes each batch as a tar
# archive in the destination directory for later transfer.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/tarspool/config.yml
#   3. /etc/tarspool/config.yml

source:
  # Directory the data producer writes into. Must exist at start.
  dir: /data/instrument/output

  # Regex matched against file names. Only matching files are archived.
  # Anchor a suffix to pick one output format, e.g. '.*\.csv$'
  pattern: '.*'

  # Also watch and scan subdirectories.
  recursive: false

  # Skip files already present at start; archive only new arrivals.
  ignore_existing: false

archive:
  # Directory completed archives are written to. Must exist at start.
  dir: /data/export

  # Archive names are '<prefix><sequence>.tar', e.g. 'run_0.tar'.
  prefix: ''

  # Files per archive. A partial batch is written on shutdown.
  batch_size: 4000

  # First sequence number. Raise this to continue an earlier series.
  sequence_offset: 0

debounce:
  # Quiet window a file must survive without further writes before it is
  # considered complete. Accepts '30s', '2m', '1h'.
  delay: 60s
"#
    .to_string()
}
