//! Canonical sparse linear-program form. The model builder emits into this
//! representation; solver backends consume it; the MPS writer serialises it
//! for offline inspection.

use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimise,
    Maximise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

impl Relation {
    fn mps_code(self) -> char {
        match self {
            Relation::Le => 'L',
            Relation::Ge => 'G',
            Relation::Eq => 'E',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub integer: bool,
    pub objective: f64,
}

impl Column {
    pub fn is_binary(&self) -> bool {
        self.integer && self.lower == 0.0 && self.upper == 1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub relation: Relation,
    pub rhs: f64,
    pub terms: Vec<(usize, f64)>,
}

/// A mixed-integer linear program over dense column indices. The objective may
/// carry a constant offset; backends optimise the variable part and the offset
/// is folded into reported objective values.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub sense: Sense,
    pub objective_offset: f64,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl LinearModel {
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            objective_offset: 0.0,
            columns: vec![],
            rows: vec![],
        }
    }

    pub fn push_column(
        &mut self,
        name: String,
        lower: f64,
        upper: f64,
        integer: bool,
        objective: f64,
    ) -> usize {
        debug_assert!(lower <= upper, "column {name} has crossed bounds");
        self.columns.push(Column {
            name,
            lower,
            upper,
            integer,
            objective,
        });
        self.columns.len() - 1
    }

    pub fn binary(&mut self, name: String) -> usize {
        self.push_column(name, 0.0, 1.0, true, 0.0)
    }

    pub fn push_row(
        &mut self,
        name: String,
        relation: Relation,
        rhs: f64,
        terms: Vec<(usize, f64)>,
    ) {
        debug_assert!(
            terms.iter().all(|&(column, _)| column < self.columns.len()),
            "row {name} references a column that does not exist"
        );
        self.rows.push(Row {
            name,
            relation,
            rhs,
            terms,
        });
    }

    pub fn add_objective(&mut self, column: usize, coefficient: f64) {
        self.columns[column].objective += coefficient;
    }

    /// Pins a column to a constant.
    pub fn fix(&mut self, column: usize, value: f64) {
        self.columns[column].lower = value;
        self.columns[column].upper = value;
    }

    pub fn set_lower(&mut self, column: usize, lower: f64) {
        self.columns[column].lower = lower;
    }

    pub fn set_upper(&mut self, column: usize, upper: f64) {
        self.columns[column].upper = upper;
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Objective value of a primal point, offset included.
    pub fn objective_value(&self, primal: &[f64]) -> f64 {
        debug_assert_eq!(self.columns.len(), primal.len());
        self.objective_offset
            + self
                .columns
                .iter()
                .zip(primal)
                .map(|(column, &value)| column.objective * value)
                .sum::<f64>()
    }

    /// Writes the model in free MPS. Integer columns are wrapped in
    /// INTORG/INTEND marker blocks; binaries use BV bounds.
    pub fn write_mps(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "NAME          {}", env!("CARGO_PKG_NAME"))?;
        if self.sense == Sense::Maximise {
            writeln!(out, "OBJSENSE\n    MAX")?;
        }
        writeln!(out, "ROWS")?;
        writeln!(out, " N  obj")?;
        for row in &self.rows {
            writeln!(out, " {}  {}", row.relation.mps_code(), row.name)?;
        }

        // The COLUMNS section is column-major; transpose the row terms.
        let mut entries: Vec<Vec<(&str, f64)>> = vec![vec![]; self.columns.len()];
        for (index, column) in self.columns.iter().enumerate() {
            if column.objective != 0.0 {
                entries[index].push(("obj", column.objective));
            }
        }
        for row in &self.rows {
            for &(column, coefficient) in &row.terms {
                entries[column].push((&row.name, coefficient));
            }
        }

        writeln!(out, "COLUMNS")?;
        let mut in_integer_block = false;
        let mut markers = 0usize;
        for (index, column) in self.columns.iter().enumerate() {
            if column.integer != in_integer_block {
                let kind = if column.integer { "'INTORG'" } else { "'INTEND'" };
                writeln!(out, "    MARKER{markers}  'MARKER'  {kind}")?;
                markers += 1;
                in_integer_block = column.integer;
            }
            for (row_name, coefficient) in &entries[index] {
                writeln!(out, "    {}  {}  {}", column.name, row_name, coefficient)?;
            }
        }
        if in_integer_block {
            writeln!(out, "    MARKER{markers}  'MARKER'  'INTEND'")?;
        }

        writeln!(out, "RHS")?;
        for row in &self.rows {
            if row.rhs != 0.0 {
                writeln!(out, "    rhs  {}  {}", row.name, row.rhs)?;
            }
        }

        writeln!(out, "BOUNDS")?;
        for column in &self.columns {
            if column.is_binary() {
                writeln!(out, " BV bnd  {}", column.name)?;
                continue;
            }
            if column.lower == column.upper {
                writeln!(out, " FX bnd  {}  {}", column.name, column.lower)?;
                continue;
            }
            if column.lower != 0.0 {
                if column.lower.is_infinite() {
                    writeln!(out, " MI bnd  {}", column.name)?;
                } else {
                    writeln!(out, " LO bnd  {}  {}", column.name, column.lower)?;
                }
            }
            if column.upper.is_finite() {
                writeln!(out, " UP bnd  {}  {}", column.name, column.upper)?;
            }
        }
        writeln!(out, "ENDATA")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;

    fn knapsack() -> LinearModel {
        let mut model = LinearModel::new(Sense::Maximise);
        let x = model.binary("x".into());
        let y = model.binary("y".into());
        let slack = model.push_column("slack".into(), 0.0, f64::INFINITY, false, 0.0);
        model.add_objective(x, 3.0);
        model.add_objective(y, 2.0);
        model.push_row(
            "weight".into(),
            Relation::Le,
            4.0,
            vec![(x, 3.0), (y, 2.0), (slack, 1.0)],
        );
        model
    }

    #[test]
    fn objective_value_includes_offset() {
        let mut model = knapsack();
        model.objective_offset = 1.5;
        assert_float_absolute_eq!(4.5, model.objective_value(&[1.0, 0.0, 0.0]), 1e-12);
        assert_float_absolute_eq!(3.5, model.objective_value(&[0.0, 1.0, 2.0]), 1e-12);
    }

    #[test]
    fn fix_pins_both_bounds() {
        let mut model = knapsack();
        model.fix(0, 1.0);
        assert_eq!(1.0, model.columns()[0].lower);
        assert_eq!(1.0, model.columns()[0].upper);
    }

    #[test]
    fn mps_sections_are_emitted() {
        let model = knapsack();
        let mut buffer = vec![];
        model.write_mps(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        for section in [
            "NAME", "OBJSENSE", "ROWS", "COLUMNS", "RHS", "BOUNDS", "ENDATA",
        ] {
            assert!(text.contains(section), "missing section {section}:\n{text}");
        }
        assert!(text.contains(" L  weight"));
        assert!(text.contains("'INTORG'"));
        assert!(text.contains("'INTEND'"));
        assert!(text.contains(" BV bnd  x"));
        assert!(text.contains("    rhs  weight  4"));
        // The continuous slack column must sit outside the integer block.
        let intend = text.find("'INTEND'").unwrap();
        let slack = text.find("    slack").unwrap();
        assert!(slack > intend);
    }

    #[test]
    fn binary_classification() {
        let model = knapsack();
        assert!(model.columns()[0].is_binary());
        assert!(!model.columns()[2].is_binary());
    }
}
