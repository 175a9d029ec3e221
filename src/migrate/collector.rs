use super::Migration;

/// Append-only list of migrations in discovery order.
///
/// Never reorders or deduplicates; a package revisited at a higher version may
/// contribute the same generator twice.
#[derive(Debug, Default)]
pub struct MigrationCollector {
    migrations: Vec<Migration>,
}

impl MigrationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, migration: Migration) {
        self.migrations.push(migration);
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn into_migrations(self) -> Vec<Migration> {
        self.migrations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migration(package: &str, name: &str) -> Migration {
        Migration {
            package: package.into(),
            version: "2.0.0".into(),
            name: name.into(),
            factory: format!("{}-factory", package),
            description: None,
        }
    }

    #[test]
    fn test_push_preserves_order_and_duplicates() {
        let mut collector = MigrationCollector::new();
        assert!(collector.is_empty());

        collector.push(migration("parent", "update-2"));
        collector.push(migration("child", "update-2"));
        collector.push(migration("parent", "update-2"));

        assert_eq!(collector.len(), 3);

        let migrations = collector.into_migrations();
        let packages: Vec<&str> = migrations.iter().map(|m| m.package.as_str()).collect();
        assert_eq!(packages, vec!["parent", "child", "parent"]);
        assert_eq!(migrations[0], migrations[2]);
    }
}
