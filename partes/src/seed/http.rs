//! Seeding through the REST API of a running server.

use super::{Roster, SeedError, SeedFailure, SeedReport};
use crate::client_config::ApiClient;
use crate::types::TipoRecurso;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Longest response body kept in a failure message.
const MAX_BODY: usize = 512;

/// POST every record to `/recursos`, one at a time, pausing `delay` between requests.
///
/// A rejected or failed record is reported and the loop moves on.
#[instrument(skip_all, fields(api_base = api.api_base(), records = roster.len()))]
pub async fn seed(api: &ApiClient, roster: &Roster, delay: Duration) -> SeedReport {
    let mut report = SeedReport::default();

    for (i, recurso) in roster.recursos.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        report.attempted += 1;

        match api.post_json("/recursos", recurso).await {
            Ok(response) if response.status().is_success() => {
                info!(codigo = %recurso.codigo, status = %response.status(), "Created recurso");
                report.succeeded += 1;
            }
            Ok(response) => {
                let status = response.status();
                let mut message = response.text().await.unwrap_or_default();
                if message.is_empty() {
                    message = status.canonical_reason().unwrap_or("request rejected").to_string();
                }
                if message.len() > MAX_BODY {
                    let cut = (0..=MAX_BODY).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
                    message.truncate(cut);
                }
                warn!(codigo = %recurso.codigo, %status, %message, "API rejected recurso");
                report.failed.push(SeedFailure {
                    codigo: recurso.codigo.clone(),
                    status: Some(status.as_u16()),
                    message,
                });
            }
            Err(e) => {
                warn!(codigo = %recurso.codigo, error = %e, "Request failed");
                report.failed.push(SeedFailure {
                    codigo: recurso.codigo.clone(),
                    status: None,
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

#[derive(Debug, Deserialize)]
struct Listed {
    codigo: String,
    tipo: TipoRecurso,
}

/// Codes held by the API, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSummary(pub BTreeMap<TipoRecurso, Vec<String>>);

impl RosterSummary {
    pub fn count(&self, tipo: TipoRecurso) -> usize {
        self.0.get(&tipo).map_or(0, Vec::len)
    }
}

impl fmt::Display for RosterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tipo in TipoRecurso::ALL {
            let codigos = self.0.get(&tipo).map(Vec::as_slice).unwrap_or_default();
            writeln!(f, "{tipo}: {}", codigos.len())?;
            for codigo in codigos {
                writeln!(f, "  {codigo}")?;
            }
        }
        Ok(())
    }
}

/// Read back `GET /recursos` and group the codes by category.
pub async fn summarize(api: &ApiClient) -> Result<RosterSummary, SeedError> {
    let listed: Vec<Listed> = api.get_json("/recursos?limit=1000").await?;

    let mut summary = RosterSummary::default();
    for item in listed {
        summary.0.entry(item.tipo).or_default().push(item.codigo);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_config::ClientConfig;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(base: String) -> ApiClient {
        ApiClient::new(&ClientConfig {
            api_base: base,
            ..ClientConfig::default()
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_rejections_are_counted_and_the_loop_continues() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recursos"))
            .and(body_partial_json(json!({"codigo": "OP003"})))
            .respond_with(ResponseTemplate::new(409).set_body_string("codigo already exists"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/recursos"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(18)
            .mount(&server)
            .await;

        let roster = Roster::embedded().unwrap();
        let report = seed(&api(server.uri()), &roster, Duration::ZERO).await;

        assert_eq!(report.attempted, 19);
        assert_eq!(report.succeeded, 18);
        assert_eq!(
            report.failed,
            vec![SeedFailure {
                codigo: "OP003".to_string(),
                status: Some(409),
                message: "codigo already exists".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_requests_are_spaced_by_the_delay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let roster = Roster {
            recursos: Roster::embedded().unwrap().recursos.into_iter().take(3).collect(),
        };
        let delay = Duration::from_millis(50);

        let started = Instant::now();
        let report = seed(&api(server.uri()), &roster, delay).await;

        assert_eq!(report.succeeded, 3);
        assert!(started.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn test_transport_errors_are_recorded() {
        let roster = Roster {
            recursos: Roster::embedded().unwrap().recursos.into_iter().take(2).collect(),
        };

        let report = seed(&api("http://127.0.0.1:9".to_string()), &roster, Duration::ZERO).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 0);
        assert!(report.failed.iter().all(|f| f.status.is_none()));
    }

    #[tokio::test]
    async fn test_summary_groups_by_tipo() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recursos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"codigo": "OP001", "tipo": "operario", "nombre": "Ana"},
                {"codigo": "MQ001", "tipo": "maquina", "nombre": "Grúa"},
                {"codigo": "OP002", "tipo": "operario", "nombre": "Luis"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let summary = summarize(&api(server.uri())).await.unwrap();

        assert_eq!(summary.count(TipoRecurso::Operario), 2);
        assert_eq!(summary.count(TipoRecurso::Maquina), 1);
        assert_eq!(summary.to_string(), "operario: 2\n  OP001\n  OP002\nmaquina: 1\n  MQ001\n");
    }
}
