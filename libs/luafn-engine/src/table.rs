//! Engine-side value tree, detached from any live Lua state.

/// Value as the engine sees it: five runtime shapes plus a marker for
/// everything that has no protocol counterpart.
#[derive(Debug, Clone, PartialEq)]
pub enum LuaValue {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Table(Table),
    /// Engine type name of a value that cannot leave the engine
    /// (function, userdata, thread).
    Foreign(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableKey {
    Integer(i64),
    Number(f64),
    String(String),
    /// Engine type name of a key shape the protocol cannot express.
    Foreign(&'static str),
}

impl TableKey {
    /// String form used when the table becomes an object.
    ///
    /// Foreign keys have none; the error carries their engine type name.
    pub fn into_name(self) -> Result<String, &'static str> {
        match self {
            TableKey::Integer(i) => Ok(i.to_string()),
            TableKey::Number(n) => Ok(n.to_string()),
            TableKey::String(s) => Ok(s),
            TableKey::Foreign(type_name) => Err(type_name),
        }
    }
}

impl From<&str> for TableKey {
    fn from(s: &str) -> Self {
        TableKey::String(s.to_string())
    }
}

impl From<i64> for TableKey {
    fn from(i: i64) -> Self {
        TableKey::Integer(i)
    }
}

/// Ordered key/value entries of one table.
///
/// Entry order is traversal order, which the engine does not define.
/// Consumers must not depend on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    entries: Vec<(TableKey, LuaValue)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<TableKey>, value: LuaValue) {
        self.entries.push((key.into(), value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(TableKey, LuaValue)> {
        self.entries.iter()
    }
}

impl IntoIterator for Table {
    type Item = (TableKey, LuaValue);
    type IntoIter = std::vec::IntoIter<(TableKey, LuaValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<TableKey>> FromIterator<(K, LuaValue)> for Table {
    fn from_iter<I: IntoIterator<Item = (K, LuaValue)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}
