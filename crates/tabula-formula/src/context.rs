//! Resolution contexts
//!
//! A [`Context`] answers three questions for the evaluator: what a name is
//! bound to, what is stored at a cell, and what a rectangle holds. Contexts
//! nest through parent references:
//!
//! - [`Environment`]: name bindings (functions, variables)
//! - [`SheetScope`]: cell and range lookups against one [`View`]
//! - [`WorkbookScope`]: picks the sheet a reference names, or the active one
//!
//! Each scope answers what it can and delegates the rest to its parent. A
//! [`ScopeStack`] lets a caller temporarily substitute the context that
//! evaluation runs against.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use log::{debug, trace};
use tabula_core::{Book, CellError, Position, Range, View};

use crate::ast::Expr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::evaluate;
use crate::function::Function;
use crate::functions::register_builtins;
use crate::parser::parse;
use crate::value::{Array, Value};

/// Lookup service consumed by the evaluator
pub trait Context {
    /// Value bound to an identifier
    fn resolve(&self, name: &str) -> FormulaResult<Value>;

    /// Value stored at a single cell
    fn at(&self, position: &Position) -> FormulaResult<Value>;

    /// Values of a rectangle as an array, rows top to bottom
    fn range(&self, range: &Range) -> FormulaResult<Value>;
}

// === Environment ===

/// Name bindings with an optional parent
#[derive(Default)]
pub struct Environment<'p> {
    bindings: AHashMap<String, Value>,
    parent: Option<&'p dyn Context>,
}

impl<'p> Environment<'p> {
    /// An empty environment with no parent
    pub fn new() -> Self {
        Self {
            bindings: AHashMap::new(),
            parent: None,
        }
    }

    /// An empty environment delegating unbound names to `parent`
    pub fn with_parent(parent: &'p dyn Context) -> Self {
        Self {
            bindings: AHashMap::new(),
            parent: Some(parent),
        }
    }

    /// An environment holding the builtin function library
    pub fn builtins() -> Self {
        let mut env = Self::new();
        register_builtins(&mut env);
        env
    }

    /// Bind a value, returning the previous binding
    pub fn set<S: Into<String>, V: Into<Value>>(&mut self, name: S, value: V) -> Option<Value> {
        self.bindings.insert(name.into(), value.into())
    }

    /// Bind a function under its own name
    pub fn define(&mut self, function: Function) -> Option<Value> {
        let name = function.name().to_string();
        self.bindings.insert(name, Value::Function(function))
    }

    /// Local binding only; parents are not consulted
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.bindings.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn parent(&self) -> Option<&'p dyn Context> {
        self.parent
    }
}

impl Context for Environment<'_> {
    fn resolve(&self, name: &str) -> FormulaResult<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Ok(value.clone());
        }
        match self.parent {
            Some(parent) => {
                trace!("environment delegating name {}", name);
                parent.resolve(name)
            }
            None => Err(FormulaError::UndefinedName(name.to_string())),
        }
    }

    fn at(&self, position: &Position) -> FormulaResult<Value> {
        match self.parent {
            Some(parent) => parent.at(position),
            None => Err(FormulaError::NotAvailable(format!(
                "cell lookup of {} outside a sheet",
                position
            ))),
        }
    }

    fn range(&self, range: &Range) -> FormulaResult<Value> {
        match self.parent {
            Some(parent) => parent.range(range),
            None => Err(FormulaError::NotAvailable(format!(
                "range lookup of {} outside a sheet",
                range
            ))),
        }
    }
}

// === Formula cell bookkeeping ===

/// Formula cells that may be in flight at once before evaluation gives up
pub const MAX_FORMULA_DEPTH: usize = 64;

type VisitKey = (String, u32, u32);

fn visit_key(sheet: &str, position: &Position) -> VisitKey {
    (sheet.to_lowercase(), position.row, position.column)
}

#[derive(Debug, Default)]
struct VisitState {
    in_flight: AHashSet<VisitKey>,
    finished: AHashMap<VisitKey, FormulaResult<Value>>,
}

/// Formula cells being evaluated, and the results of those already done
///
/// Shared along one scope chain. Finished results are reused for as long as
/// the chain lives, since the views it borrows cannot change meanwhile. This
/// includes volatile functions: `RAND()` in a formula cell is drawn once.
#[derive(Debug, Clone, Default)]
pub struct Visited(Rc<RefCell<VisitState>>);

impl Visited {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of formula cells in flight
    pub fn len(&self) -> usize {
        self.0.borrow().in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().in_flight.is_empty()
    }

    /// Number of formula cells with a stored result
    pub fn finished(&self) -> usize {
        self.0.borrow().finished.len()
    }

    fn result(&self, key: &VisitKey) -> Option<FormulaResult<Value>> {
        self.0.borrow().finished.get(key).cloned()
    }

    /// Mark a cell as in flight until the guard drops
    fn enter(&self, key: VisitKey, sheet: &str, position: &Position) -> FormulaResult<VisitGuard> {
        let mut state = self.0.borrow_mut();
        if state.in_flight.contains(&key) {
            return Err(FormulaError::CircularReference(
                position.clone().on_sheet(sheet).to_string(),
            ));
        }
        if state.in_flight.len() >= MAX_FORMULA_DEPTH {
            return Err(FormulaError::DepthLimit {
                position: position.clone().on_sheet(sheet).to_string(),
                limit: MAX_FORMULA_DEPTH,
            });
        }
        state.in_flight.insert(key.clone());
        Ok(VisitGuard {
            visited: self.clone(),
            key,
        })
    }

    /// Store a result; hitting the depth limit depends on the caller, so it is not kept
    fn finish(&self, key: VisitKey, result: &FormulaResult<Value>) {
        if matches!(result, Err(FormulaError::DepthLimit { .. })) {
            return;
        }
        self.0.borrow_mut().finished.insert(key, result.clone());
    }
}

struct VisitGuard {
    visited: Visited,
    key: VisitKey,
}

impl Drop for VisitGuard {
    fn drop(&mut self) {
        self.visited.0.borrow_mut().in_flight.remove(&self.key);
    }
}

/// Work item of the dependency pass
enum Step {
    Visit(Position),
    Evaluate(Position, Expr),
}

// === Sheet scope ===

/// Cell and range lookups against one sheet
///
/// Unqualified positions, and positions qualified with this sheet's name
/// (case-insensitive), are answered locally. Anything else goes to the
/// parent. Formula cells are evaluated on lookup against this scope.
pub struct SheetScope<'v> {
    view: &'v dyn View,
    parent: Option<&'v dyn Context>,
    visited: Visited,
}

impl<'v> SheetScope<'v> {
    pub fn new(view: &'v dyn View) -> Self {
        Self {
            view,
            parent: None,
            visited: Visited::new(),
        }
    }

    pub fn with_parent(view: &'v dyn View, parent: &'v dyn Context) -> Self {
        Self {
            view,
            parent: Some(parent),
            visited: Visited::new(),
        }
    }

    /// Share an in-flight set with the scope that created this one
    pub fn with_visited(mut self, visited: Visited) -> Self {
        self.visited = visited;
        self
    }

    pub fn view(&self) -> &'v dyn View {
        self.view
    }

    fn is_local(&self, sheet: Option<&str>) -> bool {
        match sheet {
            None => true,
            Some(sheet) => sheet.to_lowercase() == self.view.name().to_lowercase(),
        }
    }

    fn cell_value(&self, position: &Position) -> FormulaResult<Value> {
        let Some(cell) = self.view.cell(position) else {
            return Ok(Value::Blank);
        };
        let Some(formula) = cell.formula else {
            return Ok(Value::from(cell.value));
        };

        if let Some(result) = self.visited.result(&visit_key(self.view.name(), position)) {
            return result;
        }
        let expr = parse(&formula);
        if let Ok(expr) = &expr {
            self.evaluate_dependencies(position, expr);
        }
        self.evaluate_formula(position, expr)
    }

    /// Evaluate a formula cell once, storing the result
    fn evaluate_formula(
        &self,
        position: &Position,
        expr: FormulaResult<Expr>,
    ) -> FormulaResult<Value> {
        let key = visit_key(self.view.name(), position);
        if let Some(result) = self.visited.result(&key) {
            return result;
        }

        let guard = self.visited.enter(key.clone(), self.view.name(), position)?;
        trace!("evaluating formula at {}!{}", self.view.name(), position);
        let result = expr
            .and_then(|expr| evaluate(&expr, self))
            // A cell holds a scalar
            .map(|value| Value::from(value.to_cell_value()));
        drop(guard);

        self.visited.finish(key, &result);
        result
    }

    /// Evaluate the formula cells on this sheet that `expr` reads, deepest
    /// first, so that evaluating `origin` finds them finished
    ///
    /// Walks with an explicit stack; a long chain of formula cells would
    /// otherwise recurse once per cell. Failures are stored as results and
    /// surface only if the evaluation of `origin` actually reaches them.
    fn evaluate_dependencies(&self, origin: &Position, expr: &Expr) {
        let bounds = self.view.bounds();
        if bounds.is_empty() {
            return;
        }
        let bounds = bounds.normalized();

        let mut expanded = AHashSet::new();
        expanded.insert((origin.row, origin.column));
        let mut stack: Vec<Step> = self
            .dependencies(expr, &bounds)
            .into_iter()
            .map(Step::Visit)
            .collect();

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(position) => {
                    if !expanded.insert((position.row, position.column)) {
                        continue;
                    }
                    let Some(formula) = self.view.cell(&position).and_then(|cell| cell.formula)
                    else {
                        continue;
                    };
                    if self
                        .visited
                        .result(&visit_key(self.view.name(), &position))
                        .is_some()
                    {
                        continue;
                    }
                    let Ok(expr) = parse(&formula) else {
                        continue;
                    };
                    let dependencies = self.dependencies(&expr, &bounds);
                    stack.push(Step::Evaluate(position, expr));
                    stack.extend(dependencies.into_iter().map(Step::Visit));
                }
                Step::Evaluate(position, expr) => {
                    let _ = self.evaluate_formula(&position, Ok(expr));
                }
            }
        }
    }

    /// Cells of this sheet within `bounds` that `expr` reads
    fn dependencies(&self, expr: &Expr, bounds: &Range) -> Vec<Position> {
        let mut result = Vec::new();
        for range in expr.references() {
            if range.is_empty() || !self.is_local(range.sheet()) {
                continue;
            }
            let range = range.normalized();
            for row in range.start.row.max(bounds.start.row)..=range.end.row.min(bounds.end.row) {
                let columns = range.start.column.max(bounds.start.column)
                    ..=range.end.column.min(bounds.end.column);
                result.extend(columns.map(|column| Position::new(row, column)));
            }
        }
        result
    }
}

impl Context for SheetScope<'_> {
    fn resolve(&self, name: &str) -> FormulaResult<Value> {
        match self.parent {
            Some(parent) => parent.resolve(name),
            None => Err(FormulaError::UndefinedName(name.to_string())),
        }
    }

    fn at(&self, position: &Position) -> FormulaResult<Value> {
        if !position.is_set() {
            return Ok(Value::Error(CellError::Ref));
        }
        if self.is_local(position.sheet.as_deref()) {
            return self.cell_value(&position.without_sheet());
        }

        match self.parent {
            Some(parent) => {
                trace!("sheet {} delegating {}", self.view.name(), position);
                parent.at(position)
            }
            None => Err(FormulaError::NotAvailable(format!(
                "sheet {} cannot see {}",
                self.view.name(),
                position
            ))),
        }
    }

    fn range(&self, range: &Range) -> FormulaResult<Value> {
        if range.is_empty() {
            return Ok(Value::Error(CellError::Ref));
        }
        if !self.is_local(range.sheet()) {
            return match self.parent {
                Some(parent) => {
                    trace!("sheet {} delegating {}", self.view.name(), range);
                    parent.range(range)
                }
                None => Err(FormulaError::NotAvailable(format!(
                    "sheet {} cannot see {}",
                    self.view.name(),
                    range
                ))),
            };
        }

        let range = range.normalized();
        let mut rows = Vec::with_capacity(range.row_count() as usize);
        for row in range.start.row..=range.end.row {
            let mut values = Vec::with_capacity(range.column_count() as usize);
            for column in range.start.column..=range.end.column {
                values.push(self.cell_value(&Position::new(row, column))?);
            }
            rows.push(values);
        }

        Ok(Value::Array(Array::from_rows(rows)))
    }
}

// === Workbook scope ===

/// Routes references to the sheet they name, or to the active sheet
///
/// A reference to a sheet the book does not have is `#REF!`.
pub struct WorkbookScope<'b> {
    book: &'b dyn Book,
    parent: Option<&'b dyn Context>,
    visited: Visited,
}

impl<'b> WorkbookScope<'b> {
    pub fn new(book: &'b dyn Book) -> Self {
        Self {
            book,
            parent: None,
            visited: Visited::new(),
        }
    }

    pub fn with_parent(book: &'b dyn Book, parent: &'b dyn Context) -> Self {
        Self {
            book,
            parent: Some(parent),
            visited: Visited::new(),
        }
    }

    pub fn book(&self) -> &'b dyn Book {
        self.book
    }

    fn sheet(&self, name: Option<&str>) -> Option<&'b dyn View> {
        match name {
            Some(name) => self.book.sheet(name),
            None => self.book.active_sheet(),
        }
    }

    /// A sheet scope for `view` that resolves names and other sheets through `self`
    fn scope_for<'s>(&'s self, view: &'s dyn View) -> SheetScope<'s> {
        SheetScope::with_parent(view, self).with_visited(self.visited.clone())
    }
}

impl Context for WorkbookScope<'_> {
    fn resolve(&self, name: &str) -> FormulaResult<Value> {
        match self.parent {
            Some(parent) => parent.resolve(name),
            None => Err(FormulaError::UndefinedName(name.to_string())),
        }
    }

    fn at(&self, position: &Position) -> FormulaResult<Value> {
        let Some(view) = self.sheet(position.sheet.as_deref()) else {
            trace!("no sheet for {}", position);
            return Ok(Value::Error(CellError::Ref));
        };
        self.scope_for(view).at(&position.without_sheet())
    }

    fn range(&self, range: &Range) -> FormulaResult<Value> {
        let Some(view) = self.sheet(range.sheet()) else {
            trace!("no sheet for {}", range);
            return Ok(Value::Error(CellError::Ref));
        };
        let local = Range::new(range.start.without_sheet(), range.end.without_sheet());
        self.scope_for(view).range(&local)
    }
}

// === Scope stack ===

/// A stack of contexts; lookups go to the top frame
///
/// Frames given to [`push`](ScopeStack::push) must outlive the stack, so
/// declare them before it. A frame built after the stack goes through
/// [`with_frame`](ScopeStack::with_frame) instead.
pub struct ScopeStack<'a> {
    frames: RefCell<Vec<&'a dyn Context>>,
}

impl<'a> ScopeStack<'a> {
    /// A stack with one root frame
    pub fn new(root: &'a dyn Context) -> Self {
        Self {
            frames: RefCell::new(vec![root]),
        }
    }

    /// A stack with no frames; every lookup fails until one is pushed
    pub fn empty() -> Self {
        Self {
            frames: RefCell::new(Vec::new()),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Make `frame` the active context until the guard drops
    pub fn push(&self, frame: &'a dyn Context) -> ScopeGuard<'_, 'a> {
        let mut frames = self.frames.borrow_mut();
        let depth = frames.len();
        frames.push(frame);
        debug!("pushed scope, depth {}", depth + 1);
        ScopeGuard { stack: self, depth }
    }

    /// Run `f` against a copy of this stack with `frame` on top
    ///
    /// The frame only has to live for the call. The copy is dropped when
    /// `f` returns, so this stack is left exactly as it was.
    pub fn with_frame<'f, R>(
        &self,
        frame: &'f dyn Context,
        f: impl FnOnce(&ScopeStack<'f>) -> R,
    ) -> R
    where
        'a: 'f,
    {
        let mut frames: Vec<&'f dyn Context> = Vec::with_capacity(self.depth() + 1);
        for outer in self.frames.borrow().iter() {
            frames.push(*outer);
        }
        frames.push(frame);
        debug!("layered scope, depth {}", frames.len());
        f(&ScopeStack {
            frames: RefCell::new(frames),
        })
    }

    /// The top frame
    pub fn active(&self) -> Option<&'a dyn Context> {
        self.frames.borrow().last().copied()
    }

    /// Evaluate against the top frame
    pub fn evaluate(&self, expr: &Expr) -> FormulaResult<Value> {
        evaluate(expr, self)
    }
}

impl Context for ScopeStack<'_> {
    fn resolve(&self, name: &str) -> FormulaResult<Value> {
        match self.active() {
            Some(frame) => frame.resolve(name),
            None => Err(FormulaError::UndefinedName(name.to_string())),
        }
    }

    fn at(&self, position: &Position) -> FormulaResult<Value> {
        match self.active() {
            Some(frame) => frame.at(position),
            None => Err(FormulaError::NotAvailable(format!(
                "cell lookup of {} on an empty scope stack",
                position
            ))),
        }
    }

    fn range(&self, range: &Range) -> FormulaResult<Value> {
        match self.active() {
            Some(frame) => frame.range(range),
            None => Err(FormulaError::NotAvailable(format!(
                "range lookup of {} on an empty scope stack",
                range
            ))),
        }
    }
}

/// Pops the stack back to its depth at push time
#[must_use = "the scope is popped as soon as the guard is dropped"]
pub struct ScopeGuard<'s, 'a> {
    stack: &'s ScopeStack<'a>,
    depth: usize,
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.stack.frames.borrow_mut().truncate(self.depth);
        debug!("popped scope, depth {}", self.depth);
    }
}

// === Write-back ===

/// Store an evaluated value into a view
///
/// Arrays spill right and down from `position`. Fails with
/// [`FormulaError::ReadOnly`] when the view refuses write access.
pub fn assign(view: &mut dyn View, position: &Position, value: &Value) -> FormulaResult<()> {
    let target = view.mutable().map_err(|e| match e {
        tabula_core::Error::ReadOnly(name) => FormulaError::ReadOnly(name),
        other => FormulaError::Core(other),
    })?;

    let Value::Array(array) = value else {
        target.set_value(position, value.to_cell_value())?;
        return Ok(());
    };

    for (r, row) in array.iter_rows().enumerate() {
        for (c, element) in row.iter().enumerate() {
            let spill = spill_position(position, r, c)?;
            target.set_value(&spill, element.to_cell_value())?;
        }
    }
    Ok(())
}

fn spill_position(origin: &Position, rows: usize, columns: usize) -> FormulaResult<Position> {
    let row = u32::try_from(rows)
        .ok()
        .and_then(|r| origin.row.checked_add(r));
    let column = u32::try_from(columns)
        .ok()
        .and_then(|c| origin.column.checked_add(c));

    match (row, column) {
        (Some(row), Some(column)) => Ok(Position::new(row, column)),
        _ => Err(tabula_core::Error::InvalidAddress(format!(
            "spill from {} leaves the grid",
            origin
        ))
        .into()),
    }
}
