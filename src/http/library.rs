use crate::config::Config;
use actix_web::web::Data;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Serialize)]
struct FileEntry {
    filename: String,
    #[serde(rename = "downloadUrl")]
    download_url: String,
    size: u64,
}

#[derive(Debug, Serialize)]
struct FolderListing {
    #[serde(rename = "type")]
    kind: &'static str,
    files: Vec<FileEntry>,
    count: usize,
}

/// Lists the downloads root at request time: one entry per batch folder,
/// plus a reserved `singles` bucket for flat files.
pub(crate) async fn downloads_list(config: Data<Arc<Config>>) -> HttpResponse {
    match build_listing(Path::new(&config.downloads_directory)).await {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(error) => {
            error!(?error, "Unable to list the downloads directory");
            HttpResponse::InternalServerError().json(json!({ "error": "Unable to list downloads" }))
        }
    }
}

async fn build_listing(root: &Path) -> std::io::Result<BTreeMap<String, FolderListing>> {
    let mut listing = BTreeMap::new();

    let mut dir_reader = match tokio::fs::read_dir(root).await {
        Ok(reader) => reader,
        Err(error) if matches!(error.kind(), std::io::ErrorKind::NotFound) => {
            return Ok(listing);
        }
        Err(error) => return Err(error),
    };

    let mut singles = vec![];

    while let Some(entry) = dir_reader.next_entry().await? {
        // Names outside UTF-8 cannot be addressed through /downloads, so skip them.
        let name = match entry.file_name().to_str() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let metadata = entry.metadata().await?;

        if metadata.is_dir() {
            let files = list_folder(&root.join(&name), &name).await?;
            listing.insert(
                name,
                FolderListing {
                    kind: "collection",
                    count: files.len(),
                    files,
                },
            );
        } else {
            singles.push(FileEntry {
                download_url: format!("/downloads/{}", name),
                filename: name,
                size: metadata.len(),
            });
        }
    }

    if !singles.is_empty() {
        singles.sort_by(|a, b| a.filename.cmp(&b.filename));
        listing.insert(
            "singles".to_string(),
            FolderListing {
                kind: "singles",
                count: singles.len(),
                files: singles,
            },
        );
    }

    Ok(listing)
}

async fn list_folder(directory: &Path, folder_name: &str) -> std::io::Result<Vec<FileEntry>> {
    let mut files = vec![];

    let mut dir_reader = tokio::fs::read_dir(directory).await?;

    while let Some(entry) = dir_reader.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }

        let filename = match entry.file_name().to_str() {
            Some(name) => name.to_string(),
            None => continue,
        };
        files.push(FileEntry {
            download_url: format!("/downloads/{}/{}", folder_name, filename),
            filename,
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::build_listing;
    use std::path::PathBuf;

    async fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tunegrab-list-{}-{}", name, std::process::id()));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();
        dir
    }

    #[actix_rt::test]
    async fn should_return_empty_listing_for_missing_root() {
        let listing = build_listing(std::path::Path::new("/nonexistent/tunegrab-root"))
            .await
            .unwrap();

        assert!(listing.is_empty());
    }

    #[actix_rt::test]
    async fn should_bucket_flat_files_under_singles_and_folders_by_name() {
        let root = scratch_dir("buckets").await;
        tokio::fs::write(root.join("Artist_-_Song.mp3"), b"audio")
            .await
            .unwrap();
        tokio::fs::create_dir_all(root.join("My_Playlist")).await.unwrap();
        tokio::fs::write(root.join("My_Playlist/01_-_A_-_B.mp3"), b"audio2")
            .await
            .unwrap();

        let listing = build_listing(&root).await.unwrap();

        let singles = listing.get("singles").unwrap();
        assert_eq!(singles.kind, "singles");
        assert_eq!(singles.count, 1);
        assert_eq!(singles.files[0].filename, "Artist_-_Song.mp3");
        assert_eq!(singles.files[0].download_url, "/downloads/Artist_-_Song.mp3");
        assert_eq!(singles.files[0].size, 5);

        let folder = listing.get("My_Playlist").unwrap();
        assert_eq!(folder.kind, "collection");
        assert_eq!(folder.count, 1);
        assert_eq!(
            folder.files[0].download_url,
            "/downloads/My_Playlist/01_-_A_-_B.mp3"
        );

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[actix_rt::test]
    async fn should_skip_entries_with_non_utf8_names() {
        use std::os::unix::ffi::OsStringExt;

        let root = scratch_dir("non-utf8").await;
        tokio::fs::write(root.join("ok.mp3"), b"audio").await.unwrap();

        let mangled = std::ffi::OsString::from_vec(vec![b'b', b'a', b'd', 0xFF, b'.', b'm', b'p', b'3']);
        tokio::fs::write(root.join(mangled), b"audio").await.unwrap();

        let folder = root.join("Mixed_Folder");
        tokio::fs::create_dir_all(&folder).await.unwrap();
        tokio::fs::write(folder.join("ok.mp3"), b"audio").await.unwrap();
        let mangled = std::ffi::OsString::from_vec(vec![b'b', b'a', b'd', 0xFF, b'.', b'm', b'p', b'3']);
        tokio::fs::write(folder.join(mangled), b"audio").await.unwrap();

        let listing = build_listing(&root).await.unwrap();

        let singles = listing.get("singles").unwrap();
        assert_eq!(singles.count, 1);
        assert_eq!(singles.files[0].filename, "ok.mp3");

        let folder = listing.get("Mixed_Folder").unwrap();
        assert_eq!(folder.count, 1);
        assert_eq!(folder.files[0].filename, "ok.mp3");

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
