//! Category vocabulary operations

use rusqlite::{params, Row};

use super::Database;
use crate::error::Result;
use crate::models::Category;

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    let keywords_json: String = row.get(2)?;
    let user_id: String = row.get(4)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
        is_system: row.get(3)?,
        user_id: if user_id.is_empty() {
            None
        } else {
            Some(user_id)
        },
    })
}

impl Database {
    /// Create a category if it does not exist; returns whether it was created
    pub fn create_category(
        &self,
        name: &str,
        keywords: &[&str],
        is_system: bool,
        user_id: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO categories (name, keywords, is_system, user_id)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                name.trim().to_uppercase(),
                serde_json::to_string(&keywords)?,
                is_system,
                user_id.unwrap_or(""),
            ],
        )?;

        Ok(inserted > 0)
    }

    /// List system categories in stable name order
    ///
    /// The rule engine relies on this ordering for deterministic tie-breaks
    /// between equally-scored categories.
    pub fn list_system_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, keywords, is_system, user_id FROM categories
             WHERE is_system = 1
             ORDER BY name",
        )?;

        let categories = stmt
            .query_map([], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Names of all system categories (the AI prompt vocabulary)
    pub fn system_category_names(&self) -> Result<Vec<String>> {
        Ok(self
            .list_system_categories()?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_list() {
        let db = Database::in_memory().unwrap();

        assert!(db
            .create_category("food", &["swiggy", "ZOMATO"], true, None)
            .unwrap());
        // Second create is a no-op
        assert!(!db.create_category("FOOD", &[], true, None).unwrap());

        let categories = db.list_system_categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "FOOD");
        // Keywords are stored lowercase
        assert_eq!(categories[0].keywords, vec!["swiggy", "zomato"]);
        assert!(categories[0].is_system);
    }

    #[test]
    fn test_list_is_name_ordered() {
        let db = Database::in_memory().unwrap();

        db.create_category("TRANSPORT", &["uber"], true, None).unwrap();
        db.create_category("FOOD", &["swiggy"], true, None).unwrap();

        let names = db.system_category_names().unwrap();
        assert_eq!(names, vec!["FOOD", "TRANSPORT"]);
    }

    #[test]
    fn test_user_categories_not_listed_as_system() {
        let db = Database::in_memory().unwrap();

        db.create_category("FOOD", &[], true, None).unwrap();
        db.create_category("HOBBY", &["guitar"], false, Some("user-1"))
            .unwrap();

        let categories = db.list_system_categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "FOOD");
    }
}
