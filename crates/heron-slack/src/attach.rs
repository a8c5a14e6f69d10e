//! Inbound file handling.
//!
//! Downloads each attached file from its authenticated private URL,
//! base64-encodes the bytes as a data URL, and wraps them as uploads for
//! the prediction call. Downloads are sequential; oversized or failing
//! files are skipped with a warning rather than failing the event.

use anyhow::bail;
use base64::Engine;
use tracing::warn;

use heron_core::types::FileRef;
use heron_predict::Upload;

/// Fetch every attached file and convert it to an upload. Never fails:
/// files that cannot be fetched are dropped from the result.
pub async fn collect_uploads(
    client: &reqwest::Client,
    bot_token: &str,
    files: &[FileRef],
    max_bytes: u64,
) -> Vec<Upload> {
    let mut uploads = Vec::new();

    for file in files {
        match download(client, bot_token, file, max_bytes).await {
            Ok(bytes) => {
                uploads.push(Upload {
                    data: to_data_url(&file.mime_type, &bytes),
                    name: file.name.clone(),
                    mime: file.mime_type.clone(),
                });
            }
            Err(e) => {
                warn!(file_id = %file.id, error = %e, "file download failed, skipping");
            }
        }
    }

    uploads
}

/// The cap is enforced twice: from `Content-Length` before the body is
/// read, and on the received bytes in case the header lied or was absent.
async fn download(
    client: &reqwest::Client,
    bot_token: &str,
    file: &FileRef,
    max_bytes: u64,
) -> anyhow::Result<Vec<u8>> {
    let resp = client
        .get(&file.private_url)
        .bearer_auth(bot_token)
        .send()
        .await?
        .error_for_status()?;

    if let Some(len) = resp.content_length() {
        if len > max_bytes {
            bail!("file size {len} exceeds limit {max_bytes}");
        }
    }

    let bytes = resp.bytes().await?.to_vec();
    if bytes.len() as u64 > max_bytes {
        bail!("file size {} exceeds limit {max_bytes}", bytes.len());
    }
    Ok(bytes)
}

fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{b64}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn file_ref(url: String) -> FileRef {
        FileRef {
            id: "F1".to_string(),
            name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            private_url: url,
        }
    }

    #[test]
    fn data_url_format() {
        assert_eq!(to_data_url("text/plain", b"hi"), "data:text/plain;base64,aGk=");
    }

    #[test]
    fn data_url_empty_payload() {
        assert_eq!(to_data_url("application/pdf", b""), "data:application/pdf;base64,");
    }

    #[tokio::test]
    async fn downloaded_file_becomes_upload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/files/F1")
                .header("authorization", "Bearer xoxb-test");
            then.status(200).body("hi");
        });

        let client = reqwest::Client::new();
        let files = [file_ref(format!("{}/files/F1", server.base_url()))];
        let uploads = collect_uploads(&client, "xoxb-test", &files, 1024).await;

        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].data, "data:text/plain;base64,aGk=");
        assert_eq!(uploads[0].name, "notes.txt");
    }

    #[tokio::test]
    async fn oversized_file_is_skipped() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/F1");
            then.status(200).body("eleven bytes");
        });

        let client = reqwest::Client::new();
        let files = [file_ref(format!("{}/files/F1", server.base_url()))];
        let uploads = collect_uploads(&client, "xoxb-test", &files, 4).await;

        assert!(uploads.is_empty());
    }

    #[tokio::test]
    async fn failed_download_is_skipped() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/F1");
            then.status(403).body("not allowed");
        });

        let client = reqwest::Client::new();
        let files = [file_ref(format!("{}/files/F1", server.base_url()))];
        let uploads = collect_uploads(&client, "xoxb-test", &files, 1024).await;

        assert!(uploads.is_empty());
    }
}
