use serde_json::json;
use uuid::Uuid;

use crate::common::{PUBLIC_URL, QR_IMAGE_URL, TestApp, routes};

/// `(label, clue text, encoded link)` for every cell of a printed sheet.
fn printed_cells(html: &str) -> Vec<(String, String, String)> {
    html.split(r#"<div class="qr-item">"#)
        .skip(1)
        .map(|cell| {
            let between = |start: &str, end: &str| {
                let from = cell.find(start).expect(start) + start.len();
                let to = from + cell[from..].find(end).expect(end);
                cell[from..to].to_string()
            };
            let data = between("data=", "&amp;ecc=H");
            (
                between(r#"<div class="qr-overlay">"#, "</div>"),
                between(r#"<div class="clue-text">"#, "</div>"),
                urlencoding::decode(&data).unwrap().into_owned(),
            )
        })
        .collect()
}

#[tokio::test]
async fn printed_sheet_follows_reordered_hunt() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("Park Hunt").await;
    let oak = app.create_clue(&hunt_id, "Find the oak").await;
    let bench = app.create_clue(&hunt_id, "Find the bench").await;
    let gate = app.create_clue(&hunt_id, "Find the gate").await;

    let res = app
        .put(
            &routes::clues_reorder(&hunt_id),
            &json!({ "clue_ids": [&bench, &oak, &gate] }),
        )
        .await;
    assert_eq!(res.status, 204, "{}", res.text);

    let res = app.get(&routes::hunt_print(&hunt_id)).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.header("content-type").unwrap().starts_with("text/html"));
    assert!(res.text.contains("Park Hunt"));
    assert!(res.text.contains(QR_IMAGE_URL));

    let clue_url = |clue: &str| format!("{PUBLIC_URL}/hunt/{hunt_id}/clue/{clue}");
    let expected = vec![
        ("★".to_string(), "Starting QR Code".to_string(), clue_url(&bench)),
        ("1".to_string(), "Find the bench".to_string(), clue_url(&oak)),
        ("2".to_string(), "Find the oak".to_string(), clue_url(&gate)),
        (
            "3".to_string(),
            "Find the gate".to_string(),
            format!("{PUBLIC_URL}/hunt/{hunt_id}/complete"),
        ),
    ];
    assert_eq!(printed_cells(&res.text), expected);
}

#[tokio::test]
async fn printing_clue_less_hunt_yields_empty_grid() {
    let app = TestApp::spawn().await;
    let hunt_id = app.create_hunt("").await;

    let res = app.get(&routes::hunt_print(&hunt_id)).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert!(printed_cells(&res.text).is_empty());
    assert!(res.text.contains("Unnamed hunt"));
}

#[tokio::test]
async fn printing_missing_hunt_is_404() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::hunt_print(Uuid::now_v7())).await;

    assert_eq!(res.status, 404);
}
