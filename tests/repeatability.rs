mod support;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use reqwest::StatusCode;
use storeprobe::http::{Dispatcher, RequestSpec};
use storeprobe::services::{ApiClient, ProductService, Services};
use storeprobe::testing::assertions::{field_equals, status_code};
use storeprobe::testing::{
    Access, Dataset, MethodInfo, RecordingReporter, Runner, ScenarioError, Verdict,
};
use support::StubServer;

const LOOKUP: MethodInfo = MethodInfo {
    id: "TC-READ-001",
    group: "reads",
    description: "look products up by id",
    access: Access::ReadOnly,
};

fn services(stub: &StubServer) -> Services {
    let dispatcher = Arc::new(Dispatcher::new(5_000).unwrap());
    Services::new(ApiClient::new(dispatcher, Arc::new(RequestSpec::anonymous(stub.base_url.as_str()))))
}

async fn lookup(products: &ProductService, id: String) -> Result<(), ScenarioError> {
    let response = products.get_by_id(id.as_str()).await?;
    status_code(&response, StatusCode::OK)?;
    field_equals(&response, "id", id.parse::<i64>().unwrap_or_default())?;
    Ok(())
}

/// Verdicts keyed by scenario label, ignoring the position suffix.
async fn verdicts_by_label(products: &ProductService, ids: Vec<&str>) -> BTreeMap<String, Verdict> {
    let recorder = Arc::new(RecordingReporter::new());
    let runner = Runner::new(recorder.clone());
    let dataset = Dataset::inline("productIds", "200 for known ids", ids.into_iter().map(str::to_string));

    runner.start_suite();
    runner.run(&LOOKUP, dataset, |id| lookup(products, id)).await;
    runner.finish_suite();

    recorder
        .verdicts()
        .into_iter()
        .map(|(id, verdict)| {
            let label = id.split_once("] ").map(|(_, label)| label).unwrap_or(id.as_str());
            (label.to_string(), verdict)
        })
        .collect()
}

#[tokio::test]
async fn repeated_read_has_the_same_status_and_shape() {
    let stub = StubServer::start().await;
    let services = services(&stub);

    let first = services.products.get_by_id(5).await.unwrap();
    let second = services.products.get_by_id(5).await.unwrap();

    let shape = |body: &serde_json::Value| -> BTreeSet<String> {
        body.as_object().map(|map| map.keys().cloned().collect()).unwrap_or_default()
    };
    assert_eq!(first.status(), 200);
    assert_eq!(first.status(), second.status());
    let fields = shape(first.json().unwrap());
    assert!(fields.contains("title") && fields.contains("rating"));
    assert_eq!(fields, shape(second.json().unwrap()));
}

#[tokio::test]
async fn reordering_independent_scenarios_keeps_every_verdict() {
    let stub = StubServer::start().await;
    let services = services(&stub);
    let ids = vec!["1", "abc", "5", "99999", "10"];

    let forward = verdicts_by_label(&services.products, ids.clone()).await;
    let reversed = verdicts_by_label(&services.products, ids.into_iter().rev().collect()).await;

    assert_eq!(forward.len(), 5);
    assert_eq!(forward, reversed);
    assert_eq!(forward["5"], Verdict::Pass);
    assert!(forward["abc"].is_failure());
    assert!(forward["99999"].is_failure());
}
