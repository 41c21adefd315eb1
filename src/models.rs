use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// One row of a source table. Values line up with the owning table's `columns`;
/// `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub values: Vec<Option<String>>,
}

impl Record {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn get(&self, col: usize) -> Option<&str> {
        self.values.get(col).and_then(|v| v.as_deref())
    }
}

/// A materialized table: named columns plus rows identified by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Every row must carry exactly one value per column.
    pub fn check_shape(&self, table: &'static str) -> Result<(), InputError> {
        let expected = self.columns.len();
        for (row, r) in self.rows.iter().enumerate() {
            if r.values.len() != expected {
                return Err(InputError::RaggedRow {
                    table,
                    row,
                    expected,
                    found: r.values.len(),
                });
            }
        }
        Ok(())
    }

    /// Copy of the rows at `positions`, in the order given. Records are cloned, never modified.
    pub fn select(&self, positions: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: positions
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text: name, address, extra.
    Text,
    Mobile,
}

/// The four comparison roles a column can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRole {
    Name,
    Mobile,
    Address,
    Extra,
}

impl FieldRole {
    pub const ALL: [FieldRole; 4] = [
        FieldRole::Name,
        FieldRole::Mobile,
        FieldRole::Address,
        FieldRole::Extra,
    ];

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldRole::Mobile => FieldKind::Mobile,
            _ => FieldKind::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRole::Name => "name",
            FieldRole::Mobile => "mobile",
            FieldRole::Address => "address",
            FieldRole::Extra => "extra",
        }
    }
}

impl std::fmt::Display for FieldRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-chosen column names for each comparison role. The same column may fill
/// more than one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub name: String,
    pub mobile: String,
    pub address: String,
    pub extra: String,
}

impl ColumnRoles {
    pub fn new(
        name: impl Into<String>,
        mobile: impl Into<String>,
        address: impl Into<String>,
        extra: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mobile: mobile.into(),
            address: address.into(),
            extra: extra.into(),
        }
    }

    pub fn column(&self, role: FieldRole) -> &str {
        match role {
            FieldRole::Name => &self.name,
            FieldRole::Mobile => &self.mobile,
            FieldRole::Address => &self.address,
            FieldRole::Extra => &self.extra,
        }
    }

    /// Look the role columns up in `table`, failing on the first one that is absent.
    pub fn resolve(&self, table: &Table, label: &'static str) -> Result<ResolvedColumns, InputError> {
        let mut idx = [0usize; 4];
        for (slot, role) in idx.iter_mut().zip(FieldRole::ALL) {
            let col = self.column(role);
            if col.trim().is_empty() {
                return Err(InputError::EmptyColumnName {
                    role: role.as_str(),
                });
            }
            *slot = table
                .column_index(col)
                .ok_or_else(|| InputError::MissingColumn {
                    table: label,
                    role: role.as_str(),
                    column: col.to_string(),
                })?;
        }
        Ok(ResolvedColumns { idx })
    }
}

/// Column positions of the four roles within one particular table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    idx: [usize; 4],
}

impl ResolvedColumns {
    #[inline]
    pub fn index(&self, role: FieldRole) -> usize {
        self.idx[role as usize]
    }

    #[inline]
    pub fn value<'a>(&self, record: &'a Record, role: FieldRole) -> Option<&'a str> {
        record.get(self.index(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["Name".into(), "Phone".into(), "Addr".into(), "Age".into()],
            vec![
                Record::new(vec![Some("A".into()), Some("1".into()), None, Some("30".into())]),
                Record::new(vec![Some("B".into()), None, None, None]),
            ],
        )
    }

    #[test]
    fn resolve_roles_by_name() {
        let t = table();
        let roles = ColumnRoles::new("Name", "Phone", "Addr", "Age");
        let r = roles.resolve(&t, "daily").unwrap();
        assert_eq!(r.index(FieldRole::Mobile), 1);
        assert_eq!(r.value(&t.rows[0], FieldRole::Extra), Some("30"));
        assert_eq!(r.value(&t.rows[1], FieldRole::Mobile), None);
    }

    #[test]
    fn resolve_reports_missing_column() {
        let t = table();
        let roles = ColumnRoles::new("Name", "Mobile", "Addr", "Age");
        let err = roles.resolve(&t, "yearly").unwrap_err();
        assert_eq!(
            err,
            InputError::MissingColumn {
                table: "yearly",
                role: "mobile",
                column: "Mobile".into()
            }
        );
    }

    #[test]
    fn resolve_rejects_blank_role() {
        let t = table();
        let roles = ColumnRoles::new("Name", "Phone", " ", "Age");
        assert_eq!(
            roles.resolve(&t, "daily").unwrap_err(),
            InputError::EmptyColumnName { role: "address" }
        );
    }

    #[test]
    fn shape_check_and_select() {
        let mut t = table();
        assert!(t.check_shape("daily").is_ok());
        let sub = t.select(&[1]);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.rows[0].get(0), Some("B"));
        assert_eq!(sub.columns, t.columns);

        t.rows.push(Record::new(vec![Some("C".into())]));
        assert!(matches!(
            t.check_shape("daily"),
            Err(InputError::RaggedRow { row: 2, expected: 4, found: 1, .. })
        ));
    }
}
