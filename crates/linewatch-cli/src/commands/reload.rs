use anyhow::anyhow;
use linewatch_core::ReloadOutcome;

use crate::cli::{OutputFormat, ReloadArgs};
use crate::client::{AppContext, CliError, CliResult, classify_problem};
use crate::output::render_reload;

pub(crate) async fn handle_reload(
    ctx: &AppContext,
    args: ReloadArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let mut url = ctx.endpoint("/api/reload")?;
    if args.reset {
        url.query_pairs_mut().append_pair("reset", "true");
    }

    let response = ctx
        .client
        .post(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/reload failed: {err}")))?;

    if response.status().is_success() {
        let outcome = response
            .json::<ReloadOutcome>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse reload outcome: {err}")))?;
        render_reload(&outcome, output)
    } else {
        Err(classify_problem(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use reqwest::Client;
    use serde_json::json;

    fn context(server: &MockServer) -> AppContext {
        AppContext {
            client: Client::new(),
            base_url: server.base_url().parse().expect("valid URL"),
        }
    }

    #[tokio::test]
    async fn reload_with_reset_sets_the_query_flag() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/reload")
                .query_param("reset", "true");
            then.status(200).json_body(json!({
                "outcome": "applied",
                "applied": 2,
                "duplicates": 0,
                "unroutable": 1,
                "status_updates": 1,
                "alerts_raised": 1,
                "status_changes": [],
                "alerts": []
            }));
        });

        handle_reload(&context(&server), ReloadArgs { reset: true }, OutputFormat::Table)
            .await
            .expect("reload should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn unavailable_batch_source_is_an_operational_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/reload");
            then.status(503).json_body(json!({
                "type": "https://linewatch.dev/problems/service-unavailable",
                "title": "service unavailable",
                "status": 503,
                "detail": "batch fetch timed out after 10000 ms"
            }));
        });

        let err = handle_reload(&context(&server), ReloadArgs::default(), OutputFormat::Json)
            .await
            .expect_err("reload should fail");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("timed out"));
    }
}
