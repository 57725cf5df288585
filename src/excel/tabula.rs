//! Table detection through tabula-java, run as a memory-capped subprocess.
//!
//! tabula's JVM can balloon on large scanned PDFs; explicit `-Xmx`/`-Xms`
//! caps keep a single extraction from exhausting a small host. The jar is
//! invoked once for all pages with `--format JSON`; stdout is parsed into
//! raw grids and handed to [`Table::from_grid`].

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::excel::table::Table;
use crate::excel::TableExtractor;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Bytes of stderr kept in error messages.
const STDERR_TAIL: usize = 800;

/// tabula-java invocation settings.
#[derive(Debug, Clone)]
pub struct TabulaExtractor {
    java: PathBuf,
    jar: Option<PathBuf>,
    max_heap: String,
    initial_heap: String,
    password: Option<String>,
}

impl TabulaExtractor {
    /// Settings from `config`; the jar falls back to the `TABULA_JAR` env var.
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            java: config.java_binary.clone(),
            jar: config
                .tabula_jar
                .clone()
                .or_else(|| std::env::var_os("TABULA_JAR").map(PathBuf::from)),
            max_heap: config.java_max_heap.clone(),
            initial_heap: config.java_initial_heap.clone(),
            password: config.password.clone(),
        }
    }

    fn jar(&self) -> Result<&Path, ConvertError> {
        match &self.jar {
            Some(jar) if jar.is_file() => Ok(jar),
            Some(jar) => Err(ConvertError::TableExtraction {
                detail: format!("tabula jar not found at '{}'", jar.display()),
            }),
            None => Err(ConvertError::TableExtraction {
                detail: "no tabula jar configured\nSet TABULA_JAR=/path/to/tabula-<version>-jar-with-dependencies.jar or pass --tabula-jar.".into(),
            }),
        }
    }

    /// The full command line for extracting every table from `pdf`.
    pub fn command(&self, pdf: &Path) -> Result<Command, ConvertError> {
        let mut cmd = Command::new(&self.java);
        cmd.arg(format!("-Xmx{}", self.max_heap))
            .arg(format!("-Xms{}", self.initial_heap))
            .arg("-Djava.awt.headless=true")
            .arg("-Dfile.encoding=UTF8")
            .arg("-jar")
            .arg(self.jar()?)
            .args(["--pages", "all", "--guess", "--silent", "--format", "JSON"]);
        if let Some(ref pwd) = self.password {
            cmd.arg("--password").arg(pwd);
        }
        cmd.arg(pdf);
        Ok(cmd)
    }

    /// Check that java runs and the jar is present; returns java's version line.
    pub fn check_available(&self) -> Result<String, ConvertError> {
        self.jar()?;
        let out = Command::new(&self.java)
            .arg("-version")
            .output()
            .map_err(|e| spawn_error(&self.java, e))?;
        // `java -version` prints to stderr
        let text = String::from_utf8_lossy(&out.stderr);
        Ok(text.lines().next().unwrap_or("java").trim().to_string())
    }
}

impl TableExtractor for TabulaExtractor {
    fn extract_tables(&self, pdf: &Path) -> Result<Vec<Table>, ConvertError> {
        let mut cmd = self.command(pdf)?;
        info!(
            "Running tabula with -Xmx{} -Xms{}",
            self.max_heap, self.initial_heap
        );

        let out = cmd.output().map_err(|e| spawn_error(&self.java, e))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ConvertError::TableExtraction {
                detail: format!("tabula exited with {}: {}", out.status, tail(stderr.trim())),
            });
        }

        debug!("tabula returned {} bytes of JSON", out.stdout.len());
        parse_tabula_json(&out.stdout)
    }
}

fn spawn_error(java: &Path, e: std::io::Error) -> ConvertError {
    ConvertError::TableExtraction {
        detail: format!(
            "failed to run '{}': {e}\nTable extraction requires a Java runtime on PATH (or --java).",
            java.display()
        ),
    }
}

fn tail(s: &str) -> &str {
    match s.char_indices().rev().nth(STDERR_TAIL) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[derive(Debug, Deserialize)]
struct TabulaTable {
    #[serde(default)]
    data: Vec<Vec<TabulaCell>>,
}

#[derive(Debug, Deserialize)]
struct TabulaCell {
    #[serde(default)]
    text: String,
}

/// Parse tabula's `--format JSON` output, skipping tables with no content.
pub fn parse_tabula_json(bytes: &[u8]) -> Result<Vec<Table>, ConvertError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let raw: Vec<TabulaTable> =
        serde_json::from_slice(bytes).map_err(|e| ConvertError::TableExtraction {
            detail: format!("unreadable tabula output: {e}"),
        })?;

    Ok(raw
        .into_iter()
        .filter_map(|t| {
            Table::from_grid(
                t.data
                    .into_iter()
                    .map(|row| row.into_iter().map(|c| c.text).collect())
                    .collect(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::table::CellValue;

    const SAMPLE: &str = r#"[
      {"extraction_method":"stream","page_number":1,"top":90.0,"left":40.0,
       "width":500.0,"height":120.0,"right":540.0,"bottom":210.0,
       "data":[
         [{"top":90.0,"left":40.0,"width":80.0,"height":10.0,"text":"Region"},
          {"top":90.0,"left":120.0,"width":80.0,"height":10.0,"text":"Sales"}],
         [{"top":100.0,"left":40.0,"width":80.0,"height":10.0,"text":"North"},
          {"top":100.0,"left":120.0,"width":80.0,"height":10.0,"text":"1200"}]
       ]},
      {"extraction_method":"lattice","page_number":2,"data":[]},
      {"extraction_method":"lattice","page_number":3,
       "data":[[{"text":"Year"}],[{"text":"2024"}],[{"text":"2025"}]]}
    ]"#;

    fn extractor(jar: Option<PathBuf>) -> TabulaExtractor {
        TabulaExtractor {
            java: PathBuf::from("java"),
            jar,
            max_heap: "512m".into(),
            initial_heap: "128m".into(),
            password: None,
        }
    }

    #[test]
    fn parses_tables_and_skips_empty_ones() {
        let tables = parse_tabula_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].columns, vec!["Region", "Sales"]);
        assert_eq!(
            tables[0].rows,
            vec![vec![CellValue::Text("North".into()), CellValue::Text("1200".into())]]
        );
        assert_eq!(tables[1].columns, vec!["Year"]);
        assert_eq!(tables[1].rows.len(), 2);
    }

    #[test]
    fn empty_output_means_no_tables() {
        assert!(parse_tabula_json(b"[]").unwrap().is_empty());
        assert!(parse_tabula_json(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn garbage_output_is_an_extraction_error() {
        let err = parse_tabula_json(b"Exception in thread main").unwrap_err();
        assert!(matches!(err, ConvertError::TableExtraction { .. }));
    }

    #[test]
    fn command_carries_heap_caps_and_json_format() {
        let jar = tempfile::NamedTempFile::new().unwrap();
        let tabula = extractor(Some(jar.path().to_path_buf()));
        let cmd = tabula.command(Path::new("doc.pdf")).unwrap();
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(&args[..2], &["-Xmx512m", "-Xms128m"]);
        assert!(args.windows(2).any(|w| w == ["--pages", "all"]));
        assert!(args.windows(2).any(|w| w == ["--format", "JSON"]));
        assert_eq!(args.last().map(String::as_str), Some("doc.pdf"));
        assert!(!args.iter().any(|a| a == "--password"));
    }

    #[test]
    fn password_is_forwarded() {
        let jar = tempfile::NamedTempFile::new().unwrap();
        let mut tabula = extractor(Some(jar.path().to_path_buf()));
        tabula.password = Some("s3cret".into());
        let cmd = tabula.command(Path::new("doc.pdf")).unwrap();
        let args: Vec<_> = cmd.get_args().collect();
        assert!(args.windows(2).any(|w| w[0] == "--password" && w[1] == "s3cret"));
    }

    #[test]
    fn missing_jar_is_reported_before_spawning() {
        let err = extractor(None).command(Path::new("doc.pdf")).unwrap_err();
        assert!(err.to_string().contains("TABULA_JAR"), "got: {err}");

        let err = extractor(Some(PathBuf::from("/nope/tabula.jar")))
            .extract_tables(Path::new("doc.pdf"))
            .unwrap_err();
        assert!(err.to_string().contains("/nope/tabula.jar"), "got: {err}");
    }

    #[test]
    fn stderr_tail_is_bounded() {
        let long = "x".repeat(5000);
        assert_eq!(tail(&long).len(), STDERR_TAIL + 1);
        assert_eq!(tail("short"), "short");
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Mutex;

        // exec of a script fails with ETXTBSY if another thread forked while
        // it was open for writing; hold this while writing and running one.
        static SPAWN: Mutex<()> = Mutex::new(());

        fn fake_java(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("java");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn with_java(dir: &Path, java: PathBuf) -> TabulaExtractor {
            let jar = dir.join("tabula.jar");
            fs::write(&jar, b"").unwrap();
            TabulaExtractor {
                java,
                ..extractor(Some(jar))
            }
        }

        #[test]
        fn successful_run_parses_stdout_and_passes_heap_caps() {
            let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
            let dir = tempfile::tempdir().unwrap();
            let json = dir.path().join("tables.json");
            let argv = dir.path().join("argv.txt");
            fs::write(&json, SAMPLE).unwrap();
            let java = fake_java(
                dir.path(),
                &format!(
                    "printf '%s\\n' \"$@\" > '{}'\ncat '{}'",
                    argv.display(),
                    json.display()
                ),
            );

            let tables = with_java(dir.path(), java)
                .extract_tables(Path::new("doc.pdf"))
                .unwrap();

            assert_eq!(tables.len(), 2);
            assert_eq!(tables[0].columns, vec!["Region", "Sales"]);
            let args = fs::read_to_string(&argv).unwrap();
            let args: Vec<&str> = args.lines().collect();
            assert!(args.contains(&"-Xmx512m"), "argv: {args:?}");
            assert!(args.contains(&"-Xms128m"), "argv: {args:?}");
            assert_eq!(args.last(), Some(&"doc.pdf"));
        }

        #[test]
        fn non_zero_exit_reports_stderr() {
            let _guard = SPAWN.lock().unwrap_or_else(|e| e.into_inner());
            let dir = tempfile::tempdir().unwrap();
            let java = fake_java(
                dir.path(),
                "echo 'java.lang.OutOfMemoryError: Java heap space' >&2\nexit 1",
            );

            let err = with_java(dir.path(), java)
                .extract_tables(Path::new("doc.pdf"))
                .unwrap_err();

            assert!(matches!(err, ConvertError::TableExtraction { .. }), "got: {err}");
            let msg = err.to_string();
            assert!(msg.contains("tabula exited with"), "got: {msg}");
            assert!(msg.contains("OutOfMemoryError: Java heap space"), "got: {msg}");
        }

        #[test]
        fn missing_java_is_a_spawn_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = with_java(dir.path(), dir.path().join("no-such-java"))
                .extract_tables(Path::new("doc.pdf"))
                .unwrap_err();

            assert!(matches!(err, ConvertError::TableExtraction { .. }));
            assert!(err.to_string().contains("failed to run"), "got: {err}");
        }
    }
}
