//! Tests for formula evaluation against an in-memory workbook

use pretty_assertions::assert_eq;
use tabula::prelude::*;

fn workbook() -> Workbook {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_value("A1", 10.0).unwrap();
    sheet.set_value("A2", 20.0).unwrap();
    sheet.set_value("A3", 30.0).unwrap();
    sheet.set_value("B1", 5.0).unwrap();
    sheet.set_value("B2", "apple").unwrap();
    sheet.set_value("B3", true).unwrap();
    wb
}

fn eval(wb: &Workbook, formula: &str) -> FormulaResult<Value> {
    let builtins = Environment::builtins();
    let scope = WorkbookScope::with_parent(wb, &builtins);
    evaluate(&parse(formula)?, &scope)
}

/// Test basic formula evaluation without cell references
#[test]
fn test_evaluate_simple_formulas() {
    let wb = Workbook::new();
    assert_eq!(eval(&wb, "=1+2*3"), Ok(Value::Number(7.0)));
    assert_eq!(
        eval(&wb, "=\"Hello \"&\"World\""),
        Ok(Value::from("Hello World"))
    );
    assert_eq!(eval(&wb, "=5>3"), Ok(Value::Boolean(true)));
    assert_eq!(eval(&wb, "=-2^2"), Ok(Value::Number(4.0)));
}

/// Test formula evaluation with cell references
#[test]
fn test_evaluate_with_cell_references() {
    let wb = workbook();
    assert_eq!(eval(&wb, "=A1"), Ok(Value::Number(10.0)));
    assert_eq!(eval(&wb, "=A1+A2"), Ok(Value::Number(30.0)));
    assert_eq!(eval(&wb, "=A1*B1"), Ok(Value::Number(50.0)));
    assert_eq!(eval(&wb, "=$A$1+A$2+$A3"), Ok(Value::Number(60.0)));
    assert_eq!(eval(&wb, "=Z100"), Ok(Value::Blank));
    assert_eq!(eval(&wb, "=Z100+1"), Ok(Value::Number(1.0)));
}

/// Test range functions
#[test]
fn test_evaluate_ranges() {
    let wb = workbook();
    assert_eq!(eval(&wb, "=SUM(A1:A3)"), Ok(Value::Number(60.0)));
    assert_eq!(eval(&wb, "=SUM(A3:A1)"), Ok(Value::Number(60.0)));
    assert_eq!(eval(&wb, "=AVERAGE(A1:A3)"), Ok(Value::Number(20.0)));
    assert_eq!(eval(&wb, "=COUNT(A1:B3)"), Ok(Value::Number(4.0)));
    assert_eq!(eval(&wb, "=COUNTA(A1:C3)"), Ok(Value::Number(6.0)));
    assert_eq!(eval(&wb, "=ROWS(A1:B3)"), Ok(Value::Number(3.0)));
    assert_eq!(eval(&wb, "=COLUMNS(A1:B3)"), Ok(Value::Number(2.0)));
}

/// Test criteria reducers over ranges
#[test]
fn test_evaluate_reducers() {
    let wb = workbook();
    assert_eq!(eval(&wb, "=COUNTIF(A1:A3 > 15)"), Ok(Value::Number(2.0)));
    assert_eq!(eval(&wb, "=SUMIF(A1:A3, \">15\")"), Ok(Value::Number(50.0)));
    assert_eq!(eval(&wb, "=COUNTIF(B1:B3, \"app*\")"), Ok(Value::Number(1.0)));
    assert_eq!(eval(&wb, "=AVERAGEIF(A1:A3 <> 20)"), Ok(Value::Number(20.0)));
}

/// Test IF with cell references
#[test]
fn test_evaluate_if_with_references() {
    let wb = workbook();
    assert_eq!(
        eval(&wb, "=IF(A1>B1, \"bigger\", \"smaller\")"),
        Ok(Value::from("bigger"))
    );
    assert_eq!(eval(&wb, "=IF(B3, A1, A2)"), Ok(Value::Number(10.0)));
}

/// Errors flow through formulas as values
#[test]
fn test_error_values() {
    let wb = workbook();
    assert_eq!(eval(&wb, "=A1/0"), Ok(Value::Error(CellError::Div0)));
    assert_eq!(eval(&wb, "=B2*2"), Ok(Value::Error(CellError::Na)));
    assert_eq!(eval(&wb, "=A1=B2"), Ok(Value::Error(CellError::Value)));
    assert_eq!(eval(&wb, "=IFERROR(A1/0, -1)"), Ok(Value::Number(-1.0)));
    assert_eq!(eval(&wb, "=NOSUCH(A1)"), Ok(Value::Error(CellError::Name)));
}

/// Structural failures are `Err`, not values
#[test]
fn test_structural_errors() {
    let wb = workbook();
    assert!(matches!(
        eval(&wb, "=SUM(A1"),
        Err(FormulaError::Syntax { .. })
    ));
    assert!(matches!(
        eval(&wb, "=unknown_name"),
        Err(FormulaError::UndefinedName(_))
    ));
    assert!(matches!(
        eval(&wb, "=ABS()"),
        Err(FormulaError::ArgumentCount { .. })
    ));
}

/// Formula cells are evaluated when referenced
#[test]
fn test_formula_cells() {
    let mut wb = workbook();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_formula("C1", "=SUM(A1:A3)").unwrap();
    sheet.set_formula("C2", "=C1/B1").unwrap();
    sheet.set_input("C3", "=C2&\" units\"").unwrap();

    assert_eq!(eval(&wb, "=C2"), Ok(Value::Number(12.0)));
    assert_eq!(eval(&wb, "=C3"), Ok(Value::from("12 units")));
    assert_eq!(wb.evaluate_cell("C1"), Ok(Value::Number(60.0)));
}

/// Relocating a formula shifts relative references only
#[test]
fn test_relocated_formula() {
    let wb = workbook();
    let expr = parse("=A1+$B$1").unwrap();

    let moved = expr.offset(1, 0);
    assert_eq!(moved.to_string(), "A2+$B$1");

    let builtins = Environment::builtins();
    let scope = WorkbookScope::with_parent(&wb, &builtins);
    assert_eq!(evaluate(&moved, &scope), Ok(Value::Number(25.0)));

    let off_grid = expr.offset(-1, 0);
    assert_eq!(evaluate(&off_grid, &scope), Ok(Value::Error(CellError::Ref)));
}

/// Dates are timestamps
#[test]
fn test_dates() {
    let wb = Workbook::new();
    assert_eq!(
        eval(&wb, "=TYPEOF(DATE(2024, 1, 1))"),
        Ok(Value::from("date"))
    );
    assert_eq!(
        eval(&wb, "=DATE(2024, 1, 1) + 60"),
        Ok(Value::Number(1_704_067_260.0))
    );
}

/// A running total down a long column, then a cell on another sheet reading its end
#[test]
fn test_long_running_total() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_value("A1", 1).unwrap();
    for row in 2..=5000 {
        sheet
            .set_formula(&format!("A{}", row), &format!("=A{}+1", row - 1))
            .unwrap();
    }
    let summary = wb.add_worksheet_with_name("Summary").unwrap();
    wb.worksheet_mut(summary)
        .unwrap()
        .set_formula("A1", "=Sheet1!A5000*2")
        .unwrap();

    assert_eq!(wb.evaluate_cell("A5000"), Ok(Value::Number(5000.0)));
    assert_eq!(wb.evaluate_cell("Summary!A1"), Ok(Value::Number(10000.0)));
}

/// An empty cell is only comparable with another empty cell
#[test]
fn test_empty_cell_comparisons() {
    let wb = Workbook::new();
    for formula in ["=Z1=0", "=Z1<>0", "=Z1<=0", "=Z1<1", "=Z1>\"\""] {
        assert_eq!(
            eval(&wb, formula),
            Ok(Value::Error(CellError::Value)),
            "{}",
            formula
        );
    }
    assert_eq!(eval(&wb, "=Z1=Z2"), Ok(Value::Boolean(true)));
    assert_eq!(eval(&wb, "=Z1+1"), Ok(Value::Number(1.0)));
}
