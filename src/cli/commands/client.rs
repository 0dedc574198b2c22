//! Upload and query commands - thin HTTP client for a running server.

use std::path::Path;

use reqwest::multipart::{Form, Part};

/// Client-side cap on one upload batch, matching the server default.
const MAX_UPLOAD_FILES: usize = 100;

/// Run the upload command: collect PDFs under `folder` and send them
/// as one multipart request.
pub async fn run_upload(folder: &Path, api_url: &str) {
    let api_url = api_url.trim_end_matches('/');

    let pattern = format!("{}/**/*.pdf", folder.display());
    let paths: Vec<_> = match glob::glob(&pattern) {
        Ok(entries) => entries.filter_map(|entry| entry.ok()).collect(),
        Err(e) => {
            eprintln!("Error: invalid folder path: {e}");
            std::process::exit(1);
        }
    };

    if paths.is_empty() {
        println!("No PDF files found in the folder.");
        return;
    }

    if paths.len() > MAX_UPLOAD_FILES {
        println!("Error: You can upload a maximum of {MAX_UPLOAD_FILES} PDF files.");
        return;
    }

    let mut form = Form::new();
    for path in &paths {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error: could not read {}: {e}", path.display());
                std::process::exit(1);
            }
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = match Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")
        {
            Ok(part) => part,
            Err(e) => {
                eprintln!("Error: could not prepare {}: {e}", path.display());
                std::process::exit(1);
            }
        };
        form = form.part("files", part);
    }

    let client = reqwest::Client::new();
    let response = match client
        .post(format!("{api_url}/upload/"))
        .multipart(form)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if response.status().is_success() {
        match response.json::<serde_json::Value>().await {
            Ok(body) => println!("{body}"),
            Err(e) => {
                eprintln!("Error: invalid server response: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("Error: {}", error_detail(response).await);
    }
}

/// Run the query command: post the question and print the reply.
pub async fn run_query(query: &str, api_url: &str) {
    let api_url = api_url.trim_end_matches('/');

    let client = reqwest::Client::new();
    let response = match client
        .post(format!("{api_url}/query"))
        .form(&[("query", query)])
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if response.status().is_success() {
        match response.json::<serde_json::Value>().await {
            Ok(body) => match body.get("reply").and_then(|reply| reply.as_str()) {
                Some(reply) => println!("{reply}"),
                None => println!("{body}"),
            },
            Err(e) => {
                eprintln!("Error: invalid server response: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("Error: {}", error_detail(response).await);
    }
}

/// Pull the `detail` field out of an error response body.
async fn error_detail(response: reqwest::Response) -> String {
    match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("detail")
            .and_then(|detail| detail.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => "Unknown error".to_string(),
    }
}
