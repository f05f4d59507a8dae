//! The compilation protocol shared by every node of a statement tree.
//!
//! Nodes own their children by value, so a node can only be reached
//! mutably through each of its ancestors. Every setter and every `&mut`
//! child accessor clears the cache of the node it is called on, which
//! clears the whole ancestor chain of the node being changed while leaving
//! siblings and descendants cached.

use tracing::{debug, trace};

use crate::dialect::Driver;
use crate::error::Result;
use crate::params::{ParamStyle, Params};

/// A compilable node.
pub trait Element {
    /// Compiles the node into SQL.
    ///
    /// Without `params` the node compiles as a root: it creates its own
    /// [`Params`] in the driver's marker style and, if it is cacheable,
    /// keeps both the SQL and the parameters until it is mutated or
    /// compiled for another driver. With `params` the node compiles as a
    /// fragment of a larger statement and records its markers there.
    ///
    /// # Errors
    ///
    /// Returns an error when the tree is incomplete or the driver cannot
    /// express it. A failed compilation leaves no cached SQL behind.
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String>;

    /// The parameters produced by the last root compilation, if cached.
    fn params(&self) -> Option<&Params> {
        None
    }

    /// Returns true if the last root compilation produced parameters.
    fn has_params(&self) -> bool {
        self.params().is_some_and(|params| !params.is_empty())
    }
}

/// The driver identity a cache entry is valid for.
///
/// Two drivers share a key only when they quote, mark and shape statements
/// the same way, so the key covers capabilities and hooks as well as the
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverKey {
    name: String,
    quotes: (char, char),
    value_quote: char,
    style: ParamStyle,
    limit_offset: bool,
    multi_row_insert: bool,
    hooks: [bool; 4],
}

impl DriverKey {
    /// Computes the key of a driver.
    #[must_use]
    pub fn of(driver: &dyn Driver) -> Self {
        Self {
            name: String::from(driver.name()),
            quotes: driver.identifier_quotes(),
            value_quote: driver.value_quote(),
            style: driver.param_style(),
            limit_offset: driver.supports_limit_offset(),
            multi_row_insert: driver.supports_multi_row_insert(),
            hooks: [
                driver.limit_offset_hook().is_some(),
                driver.insert_rows_hook().is_some(),
                driver.column_list_hook().is_some(),
                driver.select_decorator().is_some(),
            ],
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    key: DriverKey,
    sql: String,
    parameterized: bool,
    params: Option<Params>,
}

/// Compiled SQL memoised on a node.
///
/// Cloning a node yields an empty cache: a clone always compiles afresh.
#[derive(Debug, Default)]
pub(crate) struct Cache {
    entry: Option<CacheEntry>,
}

impl Clone for Cache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl Cache {
    pub(crate) fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            trace!("compiled SQL invalidated");
        }
    }

    pub(crate) const fn is_valid(&self) -> bool {
        self.entry.is_some()
    }

    pub(crate) fn params(&self) -> Option<&Params> {
        self.entry.as_ref().and_then(|entry| entry.params.as_ref())
    }

    fn root_hit(&self, key: &DriverKey) -> Option<&str> {
        self.entry
            .as_ref()
            .filter(|entry| entry.key == *key && entry.params.is_some())
            .map(|entry| entry.sql.as_str())
    }

    // Text that bound parameters cannot be replayed into another collector.
    fn fragment_hit(&self, key: &DriverKey) -> Option<&str> {
        self.entry
            .as_ref()
            .filter(|entry| entry.key == *key && !entry.parameterized)
            .map(|entry| entry.sql.as_str())
    }

    fn store(&mut self, key: DriverKey, sql: String, parameterized: bool, params: Option<Params>) {
        self.entry = Some(CacheEntry {
            key,
            sql,
            parameterized,
            params,
        });
    }
}

/// A node that memoises its compiled SQL.
pub(crate) trait Cached {
    /// Node name used in trace output.
    const NODE: &'static str;

    fn cache(&mut self) -> &mut Cache;

    /// Compiles the node without consulting the cache.
    fn compile_fragment(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String>;
}

/// Runs the caching protocol around [`Cached::compile_fragment`].
pub(crate) fn compile_cached<T: Cached + ?Sized>(
    node: &mut T,
    driver: &dyn Driver,
    params: Option<&mut Params>,
) -> Result<String> {
    let key = DriverKey::of(driver);
    match params {
        Some(params) => {
            if let Some(sql) = node.cache().fragment_hit(&key) {
                trace!(node = T::NODE, driver = driver.name(), "fragment cache hit");
                return Ok(String::from(sql));
            }
            node.cache().invalidate();
            let before = params.len();
            let sql = params.atomic(|params| node.compile_fragment(driver, params))?;
            let parameterized = params.len() != before;
            node.cache().store(key, sql.clone(), parameterized, None);
            Ok(sql)
        }
        None => {
            if let Some(sql) = node.cache().root_hit(&key) {
                trace!(node = T::NODE, driver = driver.name(), "cache hit");
                return Ok(String::from(sql));
            }
            node.cache().invalidate();
            let mut params = Params::new(driver.param_style());
            let sql = node.compile_fragment(driver, &mut params)?;
            let parameterized = !params.is_empty();
            debug!(
                node = T::NODE,
                driver = driver.name(),
                params = params.len(),
                "compiled statement"
            );
            node.cache().store(key, sql.clone(), parameterized, Some(params));
            Ok(sql)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDriver, MysqlDriver};
    use crate::error::Error;
    use crate::value::SqlValue;

    #[derive(Default)]
    struct Counter {
        cache: Cache,
        runs: usize,
        bind: bool,
        fail: bool,
    }

    impl Cached for Counter {
        const NODE: &'static str = "counter";

        fn cache(&mut self) -> &mut Cache {
            &mut self.cache
        }

        fn compile_fragment(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
            self.runs += 1;
            if self.fail {
                return Err(Error::MissingTable { statement: "TEST" });
            }
            let mut sql = driver.quote_identifier("x");
            if self.bind {
                sql.push_str(" = ");
                sql.push_str(&params.create(SqlValue::Int(1), None, Some("x")));
            }
            Ok(sql)
        }
    }

    #[test]
    fn test_root_compile_is_cached() {
        let driver = GenericDriver::ansi();
        let mut node = Counter {
            bind: true,
            ..Counter::default()
        };
        let first = compile_cached(&mut node, &driver, None).unwrap();
        let second = compile_cached(&mut node, &driver, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(node.runs, 1);
        assert_eq!(node.cache.params().unwrap().len(), 1);
    }

    #[test]
    fn test_driver_switch_recompiles() {
        let mut node = Counter::default();
        let ansi = compile_cached(&mut node, &GenericDriver::ansi(), None).unwrap();
        let mysql = compile_cached(&mut node, &MysqlDriver::new(), None).unwrap();
        assert_eq!(ansi, r#""x""#);
        assert_eq!(mysql, "`x`");
        assert_eq!(node.runs, 2);
    }

    #[test]
    fn test_fragment_reuse_only_without_params() {
        let driver = GenericDriver::ansi();
        let mut plain = Counter::default();
        let mut params = Params::named();
        compile_cached(&mut plain, &driver, Some(&mut params)).unwrap();
        compile_cached(&mut plain, &driver, Some(&mut params)).unwrap();
        assert_eq!(plain.runs, 1);

        let mut bound = Counter {
            bind: true,
            ..Counter::default()
        };
        let first = compile_cached(&mut bound, &driver, Some(&mut params)).unwrap();
        let second = compile_cached(&mut bound, &driver, Some(&mut params)).unwrap();
        assert_eq!(bound.runs, 2);
        assert_eq!(first, r#""x" = :x1"#);
        assert_eq!(second, r#""x" = :x2"#);
    }

    #[test]
    fn test_failed_compile_leaves_no_cache() {
        let driver = GenericDriver::ansi();
        let mut node = Counter::default();
        compile_cached(&mut node, &driver, None).unwrap();
        assert!(node.cache.is_valid());
        node.fail = true;
        node.cache.invalidate();
        assert!(compile_cached(&mut node, &driver, None).is_err());
        assert!(!node.cache.is_valid());
    }

    #[test]
    fn test_clone_is_fresh() {
        let mut node = Counter::default();
        compile_cached(&mut node, &GenericDriver::ansi(), None).unwrap();
        let copy = node.cache.clone();
        assert!(node.cache.is_valid());
        assert!(!copy.is_valid());
    }
}
