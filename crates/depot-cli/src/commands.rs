use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use depot_server::{Catalog, DepotServer, InMemoryMetaStore, RepoRef, ServerConfig};
use depot_store::{generate_pointer, ContentStore, FilesystemContentStore};
use depot_types::Pointer;
use tokio::fs::File;

use crate::cli::{Cli, Command, ImportArgs, PointerArgs, ServeArgs};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Pointer(args) => cmd_pointer(args).await,
        Command::Import(args) => cmd_import(args).await,
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = args.root {
        config.content_root = root;
    }
    if let Some(catalog) = args.catalog {
        config.catalog_path = Some(catalog);
    }

    let store = FilesystemContentStore::new(&config.content_root)
        .await
        .with_context(|| format!("opening content store {}", config.content_root.display()))?;
    let meta = match &config.catalog_path {
        Some(path) => {
            let catalog = Catalog::load(path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
            InMemoryMetaStore::from_catalog(&catalog)?
        }
        None => {
            tracing::warn!("no catalog configured, every object request will return 404");
            InMemoryMetaStore::new()
        }
    };

    println!(
        "{} Depot serving {} on {}",
        "✓".green().bold(),
        config.content_root.display().to_string().cyan(),
        config.bind_addr.to_string().bold()
    );
    DepotServer::new(config, Arc::new(store), Arc::new(meta))
        .serve()
        .await?;
    Ok(())
}

async fn cmd_pointer(args: PointerArgs) -> anyhow::Result<()> {
    let pointer = pointer_of(&args.file).await?;
    println!("oid sha256:{}", pointer.oid.to_string().yellow());
    println!("size {}", pointer.size);
    Ok(())
}

async fn pointer_of(path: &Path) -> anyhow::Result<Pointer> {
    let mut file = File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    generate_pointer(&mut file)
        .await
        .with_context(|| format!("hashing {}", path.display()))
}

async fn cmd_import(args: ImportArgs) -> anyhow::Result<()> {
    let repo: RepoRef = args.repo.parse()?;
    let imported = import_files(&repo, &args.root, &args.catalog, &args.files).await?;
    for (path, pointer, added) in &imported {
        let status = if *added { "added".green() } else { "already listed".dimmed() };
        println!(
            "  {} {} ({} bytes) {}",
            pointer.oid.short_hex().yellow(),
            path.display(),
            pointer.size,
            status
        );
    }
    println!(
        "{} Imported {} file(s) into {}",
        "✓".green().bold(),
        imported.len(),
        repo.to_string().bold()
    );
    Ok(())
}

/// Store each file and record it under `repo` in the catalog.
///
/// Returns each file's pointer and whether the catalog gained an entry.
async fn import_files(
    repo: &RepoRef,
    root: &Path,
    catalog_path: &Path,
    files: &[PathBuf],
) -> anyhow::Result<Vec<(PathBuf, Pointer, bool)>> {
    let store = FilesystemContentStore::new(root)
        .await
        .with_context(|| format!("opening content store {}", root.display()))?;
    let mut catalog = Catalog::load(catalog_path)
        .with_context(|| format!("loading catalog {}", catalog_path.display()))?;

    let mut imported = Vec::with_capacity(files.len());
    for path in files {
        let pointer = pointer_of(path).await?;
        let mut file = File::open(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        store
            .put(&pointer, &mut file)
            .await
            .with_context(|| format!("storing {}", path.display()))?;
        let added = catalog.add(repo, pointer);
        tracing::info!(%repo, %pointer, file = %path.display(), added, "imported object");
        imported.push((path.clone(), pointer, added));
    }

    catalog
        .save(catalog_path)
        .with_context(|| format!("saving catalog {}", catalog_path.display()))?;
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pointer_of_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, b"123456789\n").unwrap();
        assert_eq!(
            pointer_of(&path).await.unwrap(),
            Pointer::from_content(b"123456789\n")
        );
    }

    #[tokio::test]
    async fn pointer_of_missing_file_fails() {
        assert!(pointer_of(Path::new("/no/such/file")).await.is_err());
    }

    #[tokio::test]
    async fn import_stores_and_catalogs() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("lfs");
        let catalog_path = dir.path().join("catalog.json");
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"first object").unwrap();
        std::fs::write(&b, b"second object").unwrap();
        let repo = RepoRef::new("user2", "repo1");

        let imported = import_files(&repo, &root, &catalog_path, &[a.clone(), b])
            .await
            .unwrap();
        assert!(imported.iter().all(|(_, _, added)| *added));

        let store = FilesystemContentStore::new(&root).await.unwrap();
        for (_, pointer, _) in &imported {
            assert!(store.verify(pointer).await.unwrap());
        }
        let catalog = Catalog::load(&catalog_path).unwrap();
        assert_eq!(catalog.repositories["user2/repo1"].len(), 2);

        let again = import_files(&repo, &root, &catalog_path, &[a]).await.unwrap();
        assert!(!again[0].2);
        let catalog = Catalog::load(&catalog_path).unwrap();
        assert_eq!(catalog.repositories["user2/repo1"].len(), 2);
    }
}
