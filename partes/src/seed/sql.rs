//! Seeding through an external SQL client.
//!
//! The roster is rendered as one multi-row `INSERT` per category and written to the client's
//! stdin. The client's output is filtered and logged line by line.

use super::{ConflictPolicy, Roster, SeedError, SeedReport};
use crate::config::SqlClientConfig;
use crate::types::TipoRecurso;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Quote a string literal, doubling embedded single quotes.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_opt(value: Option<&str>) -> String {
    value.map(quote).unwrap_or_else(|| "NULL".to_string())
}

fn boolean(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// Render the roster as SQL. Categories without records produce no statement.
pub fn render(roster: &Roster, policy: ConflictPolicy) -> String {
    let mut script = String::new();

    for tipo in TipoRecurso::ALL {
        let rows: Vec<String> = roster
            .by_tipo(tipo)
            .map(|r| {
                format!(
                    "    ({}, {}, {}, {}, {})",
                    quote(r.codigo.trim()),
                    quote(&r.nombre),
                    quote(tipo.as_str()),
                    boolean(r.activo),
                    quote_opt(r.agr_coste.as_deref()),
                )
            })
            .collect();

        if rows.is_empty() {
            continue;
        }

        script.push_str(&format!("-- {}\n", tipo.as_str()));
        script.push_str("INSERT INTO recursos (codigo, nombre, tipo, activo, agr_coste) VALUES\n");
        script.push_str(&rows.join(",\n"));
        if policy == ConflictPolicy::Upsert {
            script.push_str(
                "\nON CONFLICT (codigo) DO UPDATE SET\n    nombre = EXCLUDED.nombre,\n    tipo = EXCLUDED.tipo,\n    activo = EXCLUDED.activo,\n    agr_coste = EXCLUDED.agr_coste",
            );
        }
        script.push_str(";\n\n");
    }

    script
}

/// A command-line SQL client that reads statements from stdin.
#[derive(Debug, Clone)]
pub struct SqlClient {
    program: String,
    args: Vec<String>,
    noise: Vec<String>,
}

impl SqlClient {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            noise: Vec::new(),
        }
    }

    pub fn with_noise(mut self, noise: Vec<String>) -> Self {
        self.noise = noise;
        self
    }

    pub fn from_config(config: &SqlClientConfig, database_url: &str) -> Self {
        Self::new(config.program.clone(), config.resolved_args(database_url)).with_noise(config.noise.clone())
    }

    fn is_noise(&self, line: &str) -> bool {
        line.trim().is_empty() || self.noise.iter().any(|n| line.contains(n.as_str()))
    }

    /// Run the client with `script` on stdin. Returns the meaningful output lines.
    #[instrument(skip_all, fields(program = %self.program), err)]
    pub async fn execute(&self, script: &str) -> Result<Vec<String>, SeedError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SeedError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A client that exits early closes the pipe; its exit status tells the rest.
            match stdin.write_all(script.as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("SQL client closed stdin early");
                }
                Err(source) => {
                    return Err(SeedError::Spawn {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        }

        let output = child.wait_with_output().await.map_err(|source| SeedError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<String> = stdout
            .lines()
            .chain(stderr.lines())
            .filter(|line| !self.is_noise(line))
            .map(|line| line.trim_end().to_string())
            .collect();

        if !output.status.success() {
            return Err(SeedError::Client {
                program: self.program.clone(),
                status: output.status.code(),
                output: lines.join("\n"),
            });
        }

        for line in &lines {
            info!(target: "partes::seed::sql_client", "{line}");
        }
        Ok(lines)
    }
}

/// Load the roster through `client`. The script runs as a whole, so every record succeeds or
/// the run fails.
pub async fn seed(client: &SqlClient, roster: &Roster, policy: ConflictPolicy) -> Result<SeedReport, SeedError> {
    if roster.is_empty() {
        warn!("Roster is empty, nothing to send");
        return Ok(SeedReport::default());
    }

    let script = render(roster, policy);
    client.execute(&script).await?;

    Ok(SeedReport {
        attempted: roster.len(),
        succeeded: roster.len(),
        failed: Vec::new(),
    })
}
