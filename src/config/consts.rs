// src/config/consts.rs

// Input
pub const DEFAULT_INPUT_DIR: &str = "exports";
pub const DEFAULT_HEADER_ROW: usize = 0;
pub const INPUT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

// Filters
pub const ALLOWED_UNITS: &[u32] = &[4, 5];
pub const STATUS_OPEN: &str = "ABERTO";

// Text blocks
pub const BLOCK_DELIMITER_CHAR: char = '-';
pub const BLOCK_DELIMITER_LEN: usize = 50;
pub const PLACEHOLDER: &str = "---";
pub const DATE_FORMAT: &str = "%d/%m/%Y";

// Output
pub const DEFAULT_OUT_DIR: &str = "out";
pub const TEXT_DOCUMENT_FILE: &str = "ordens.txt";
pub const PROVIDER_SUBDIR: &str = "prestadores";
pub const MANAGER_SUBDIR: &str = "gestores";
pub const RELEASE_SUBDIR: &str = "liberacao";
pub const MISSING_ESTIMATE_FILE: &str = "sem_previsao.json";
pub const REPORT_SUBDIR: &str = "relatorios";

// Report CLI defaults
pub const DEFAULT_REPORT_INPUT: &str = "out/prestadores/os_prestador.json";
pub const DEFAULT_REPORT_OUTPUT: &str = "out/relatorios/relatorio_os.pdf";
pub const DEFAULT_REPORT_TITLE: &str = "Ordens de Serviço em Aberto";

// Local store (debug log)
pub const DEFAULT_LOG_PATH: &str = ".store/debug.log";
pub const LOG_ENV: &str = "OS_PIPELINE_LOG";
