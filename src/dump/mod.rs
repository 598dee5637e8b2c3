//! MySQL dump reading: statement streaming and tuple tokenizing.
//!
//! Both stages are pure transformations over file contents and never
//! touch the store.

pub mod statement;
pub mod tuple;

pub use statement::{StatementAccumulator, StatementStream};
pub use tuple::{parse_insert_values, RowTuple, SqlValue};

use crate::error::Result;
use std::path::Path;

/// Stream every row of every `INSERT` statement in a dump file, in file order.
pub fn read_rows(path: &Path) -> Result<impl Iterator<Item = Result<RowTuple>> + Send> {
    let statements = StatementStream::open(path)?;
    Ok(statements.flat_map(|statement| -> Box<dyn Iterator<Item = Result<RowTuple>> + Send> {
        match statement {
            Ok(text) => Box::new(parse_insert_values(&text).into_iter().map(Ok)),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }))
}
