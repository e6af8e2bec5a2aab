use std::fs;
use std::path::PathBuf;

use indoc::indoc;
use tempfile::TempDir;

pub const SCHEMA: &str = indoc! {r#"
    {
      "collections": [
        {
          "name": "products",
          "attributes": {
            "name": "string",
            "price": "float",
            "brand_id": "int64",
            "tags": { "type": "string[]", "empty_filtering": true },
            "description": { "type": "string", "optional": true }
          },
          "joins": {
            "brand": { "collection": "brands", "local_key": "brand_id", "foreign_key": "id" }
          },
          "scopes": {
            "cheap": ["price < ?", 50],
            "tagged": { "tags": ["sale", "new"] }
          }
        },
        {
          "name": "brands",
          "attributes": { "name": "string", "country": "string" }
        }
      ]
    }
"#};

/// A temp dir holding named JSON fixtures.
pub struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn schema(&self) -> PathBuf {
        self.write("schema.json", SCHEMA)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
