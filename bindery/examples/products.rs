//! Product catalog wired by bindery.
//!
//! ```text
//! cargo run -p bindery --example products [path/to/products.csv]
//! RUST_LOG=bindery=trace cargo run -p bindery --example products
//! ```

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bindery::{Component, Container, bind};
use tracing_subscriber::EnvFilter;

// === Capabilities ===

trait FileReaderService: Send + Sync {
    fn read_from_file(&self, path: &Path) -> std::io::Result<Vec<String>>;
}

trait ProductParser: Send + Sync {
    fn parse(&self, line: &str) -> Option<Product>;
}

trait ProductService: Send + Sync {
    fn get_all_from_file(&self, path: &Path) -> std::io::Result<Vec<Product>>;
}

#[derive(Debug)]
struct Product {
    id: u64,
    name: String,
    category: String,
    price: f64,
}

// === Components ===

#[derive(Component)]
struct FileReaderServiceImpl;

impl FileReaderService for FileReaderServiceImpl {
    fn read_from_file(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let content = fs::read_to_string(path)?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

#[derive(Component)]
struct ProductParserImpl;

impl ProductParser for ProductParserImpl {
    fn parse(&self, line: &str) -> Option<Product> {
        let mut fields = line.split(',').map(str::trim);
        let product = Product {
            id: fields.next()?.parse().ok()?,
            name: fields.next()?.to_string(),
            category: fields.next()?.to_string(),
            price: fields.next()?.parse().ok()?,
        };
        fields.next().is_none().then_some(product)
    }
}

#[derive(Component)]
struct ProductServiceImpl {
    #[inject]
    reader: Arc<dyn FileReaderService>,
    #[inject]
    parser: Arc<dyn ProductParser>,
}

impl ProductService for ProductServiceImpl {
    fn get_all_from_file(&self, path: &Path) -> std::io::Result<Vec<Product>> {
        let lines = self.reader.read_from_file(path)?;
        Ok(lines
            .iter()
            .skip(1)
            .filter_map(|line| self.parser.parse(line))
            .collect())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bindery=debug")),
        )
        .init();

    let builder = Container::builder();
    let builder = bind!(builder, dyn FileReaderService => FileReaderServiceImpl);
    let builder = bind!(builder, dyn ProductParser => ProductParserImpl);
    let container = bind!(builder, dyn ProductService => ProductServiceImpl).build()?;

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("examples/data/products.csv"));

    let service = container.resolve::<dyn ProductService>()?;
    let products = service.get_all_from_file(&path)?;

    tracing::info!(count = products.len(), path = %path.display(), "Loaded products");
    for product in &products {
        println!(
            "#{:<3} {:<16} {:<8} {:>7.2}",
            product.id, product.name, product.category, product.price
        );
    }

    println!("{container:?}");
    Ok(())
}
