use chrono::NaiveDate;
use std::fmt;

//==============================================================================
// Cells
//==============================================================================

/// A single spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    /// Native spreadsheet date (YYYYMMDD-style dates arrive as Text or Integer)
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text view of the cell; missing values read as `None`
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    /// Integer view of the cell (floats are rounded, text is parsed)
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Number(f) if f.is_finite() => Some(f.round() as i64),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.round() as i64)
                })
            }
            _ => None,
        }
    }

    /// Decimal view of the cell
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Number(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

//==============================================================================
// Records and tables
//==============================================================================

/// One spreadsheet row. Cells are positional, aligned with `Table::headers`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

impl Record {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn get(&self, idx: usize) -> &CellValue {
        self.cells.get(idx).unwrap_or(&CellValue::Empty)
    }

    pub fn set(&mut self, idx: usize, value: CellValue) {
        if idx >= self.cells.len() {
            self.cells.resize(idx + 1, CellValue::Empty);
        }
        self.cells[idx] = value;
    }
}

/// An ordered sequence of records sharing one header row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, mut record: Record) {
        record.cells.resize(self.headers.len(), CellValue::Empty);
        self.rows.push(record);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, appending an empty column when it does not exist yet
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.cells.push(CellValue::Empty);
        }
        self.headers.len() - 1
    }

    /// Text values of one column (missing cells → `None`)
    pub fn text_column(&self, name: &str) -> Vec<Option<String>> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().map(|r| r.get(idx).as_text()).collect(),
            None => vec![None; self.rows.len()],
        }
    }

    /// Rebuild the table with the given header order. Columns not present
    /// in `order` are dropped; names absent from the table become empty.
    /// Repeated names map to the table's columns of that name in turn.
    pub fn reorder_columns(&mut self, order: &[String]) {
        let mut claimed = vec![false; self.headers.len()];
        let mapping: Vec<Option<usize>> = order
            .iter()
            .map(|name| {
                let idx = (0..self.headers.len()).find(|&i| !claimed[i] && &self.headers[i] == name);
                if let Some(i) = idx {
                    claimed[i] = true;
                }
                idx
            })
            .collect();
        for row in &mut self.rows {
            let cells = mapping
                .iter()
                .map(|idx| idx.map_or(CellValue::Empty, |i| row.get(i).clone()))
                .collect();
            row.cells = cells;
        }
        self.headers = order.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(vec!["a".to_string(), "b".to_string()]);
        table.push_row(Record::new(vec!["x".into(), CellValue::Integer(1)]));
        table.push_row(Record::new(vec!["y".into()]));
        table
    }

    #[test]
    fn test_push_row_pads_short_records() {
        let table = sample();
        assert_eq!(table.rows[1].cells.len(), 2);
        assert_eq!(table.rows[1].get(1), &CellValue::Empty);
    }

    #[test]
    fn test_ensure_column_appends_once() {
        let mut table = sample();
        let idx = table.ensure_column("c");
        assert_eq!(idx, 2);
        assert_eq!(table.ensure_column("c"), 2);
        assert!(table.rows.iter().all(|r| r.cells.len() == 3));
    }

    #[test]
    fn test_reorder_columns_drops_and_fills() {
        let mut table = sample();
        table.reorder_columns(&["b".to_string(), "z".to_string()]);
        assert_eq!(table.headers, vec!["b", "z"]);
        assert_eq!(table.rows[0].cells, vec![CellValue::Integer(1), CellValue::Empty]);
    }

    #[test]
    fn test_reorder_columns_keeps_duplicate_headers_apart() {
        let mut table = Table::new(vec!["Note".to_string(), "Qty".to_string(), "Note".to_string()]);
        table.push_row(Record::new(vec!["first".into(), CellValue::Integer(2), "second".into()]));
        table.ensure_column("Derived");

        let order = vec!["Note".to_string(), "Qty".to_string(), "Note".to_string()];
        table.reorder_columns(&order);
        assert_eq!(table.headers, order);
        assert_eq!(
            table.rows[0].cells,
            vec!["first".into(), CellValue::Integer(2), "second".into()]
        );
    }

    #[test]
    fn test_cell_integer_views() {
        assert_eq!(CellValue::Number(12.0).as_integer(), Some(12));
        assert_eq!(CellValue::Text(" -4 ".into()).as_integer(), Some(-4));
        assert_eq!(CellValue::Text("7.0".into()).as_integer(), Some(7));
        assert_eq!(CellValue::Empty.as_integer(), None);
    }

    #[test]
    fn test_cell_text_view_treats_blank_as_missing() {
        assert_eq!(CellValue::Text("   ".into()).as_text(), None);
        assert_eq!(CellValue::Integer(20240131).as_text(), Some("20240131".to_string()));
        assert_eq!(CellValue::Number(5.0).as_text(), Some("5".to_string()));
    }
}
