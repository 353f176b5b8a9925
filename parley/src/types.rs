/*!
Type converters. A [`ParamType`] turns a raw command line string (or a value
from a default, which may already be converted) into a typed [`Value`], and
knows how to describe itself in help text.

Conversion is idempotent: every built-in converter passes through a value
that already has its target shape, so defaults can be given either as text
(`"3"`) or as the finished value (`3`).
 */

use std::{fmt, rc::Rc};

use joinery::JoinableIterator;
use lazy_format::lazy_format;

use crate::{
    completion::CompletionItem, context::Context, errors::BadParameter, parameter::Parameter,
    value::Value,
};

/// A shared handle to a type converter
pub type TypeRef = Rc<dyn ParamType>;

/**
The type converter capability.

Only [`name`][ParamType::name] and [`convert`][ParamType::convert] are
required. Everything else has a default that suits simple scalar types.
 */
pub trait ParamType {
    /// A short description of the type, like `integer`, for messages
    fn name(&self) -> &str;

    /// Convert `value`, which is either a raw string or an already converted
    /// value, into this type.
    fn convert(
        &self,
        value: Value,
        param: &Parameter,
        ctx: &Context<'_>,
    ) -> Result<Value, BadParameter>;

    /// The placeholder shown in help text. When this returns `None`, the
    /// upper-cased [`name`][ParamType::name] is used.
    #[expect(unused_variables)]
    fn metavar(&self, param: &Parameter) -> Option<String> {
        None
    }

    /// Split an environment variable into the separate values of a
    /// multi-value parameter.
    fn split_environment_value<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        raw.split_whitespace().collect()
    }

    /// Composite types fix the number of values a parameter takes.
    fn arity(&self) -> Option<usize> {
        None
    }

    /// Extra text to show next to the parameter's help, like a range.
    fn help_extra(&self) -> Option<String> {
        None
    }

    /// Completion candidates for a value that starts with `incomplete`.
    #[expect(unused_variables)]
    fn complete(&self, ctx: &Context<'_>, incomplete: &str) -> Vec<CompletionItem> {
        Vec::new()
    }

    /// Reject type configurations that can never work; called when the
    /// owning command is built.
    fn check_declaration(&self) -> Result<(), String> {
        Ok(())
    }
}

impl fmt::Debug for dyn ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<type {}>", self.name())
    }
}

/// Build the "not a valid" message shared by the scalar converters
fn invalid(value: &Value, expected: &str) -> BadParameter {
    BadParameter::new(lazy_format!("'{value}' is not a valid {expected}."))
}

fn quoted(value: &str) -> impl fmt::Display + '_ {
    lazy_format!("'{value}'")
}

/// Text, passed through unchanged. Non-text values are formatted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl ParamType for Text {
    fn name(&self) -> &str {
        "text"
    }

    fn convert(&self, value: Value, _: &Parameter, _: &Context<'_>) -> Result<Value, BadParameter> {
        Ok(match value {
            Value::Str(s) => Value::Str(s),
            Value::Path(path) => Value::Str(path.display().to_string()),
            value => Value::Str(value.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Integer;

impl ParamType for Integer {
    fn name(&self) -> &str {
        "integer"
    }

    fn convert(&self, value: Value, _: &Parameter, _: &Context<'_>) -> Result<Value, BadParameter> {
        parse_int(value).map(Value::Int)
    }
}

fn parse_int(value: Value) -> Result<i64, BadParameter> {
    match value {
        Value::Int(i) => Ok(i),
        Value::Str(ref s) => s.trim().parse().map_err(|_| invalid(&value, "integer")),
        value => Err(invalid(&value, "integer")),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Float;

impl ParamType for Float {
    fn name(&self) -> &str {
        "float"
    }

    fn convert(&self, value: Value, _: &Parameter, _: &Context<'_>) -> Result<Value, BadParameter> {
        parse_float(value).map(Value::Float)
    }
}

fn parse_float(value: Value) -> Result<f64, BadParameter> {
    match value {
        Value::Float(x) => Ok(x),
        Value::Int(i) => Ok(i as f64),
        Value::Str(ref s) => s.trim().parse().map_err(|_| invalid(&value, "float")),
        value => Err(invalid(&value, "float")),
    }
}

/// Booleans, spelled `1`/`0`, `true`/`false`, `t`/`f`, `yes`/`no`, `y`/`n`,
/// or `on`/`off`, in any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl ParamType for Bool {
    fn name(&self) -> &str {
        "boolean"
    }

    fn convert(&self, value: Value, _: &Parameter, _: &Context<'_>) -> Result<Value, BadParameter> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            Value::Str(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" | "yes" | "y" | "on" => Ok(Value::Bool(true)),
                "0" | "false" | "f" | "no" | "n" | "off" => Ok(Value::Bool(false)),
                _ => Err(invalid(&value, "boolean")),
            },
            value => Err(invalid(&value, "boolean")),
        }
    }
}

/**
One of a fixed set of strings. Matching can be case insensitive, but the
converted value is always the declared spelling.
 */
#[derive(Debug, Clone)]
pub struct Choice {
    choices: Vec<String>,
    case_sensitive: bool,
}

impl Choice {
    pub fn new<I>(choices: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            case_sensitive: true,
        }
    }

    #[must_use]
    pub fn case_insensitive(self) -> Self {
        Self {
            case_sensitive: false,
            ..self
        }
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    fn find(&self, candidate: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|choice| match self.case_sensitive {
                true => *choice == candidate,
                false => choice.eq_ignore_ascii_case(candidate),
            })
            .map(String::as_str)
    }
}

impl ParamType for Choice {
    fn name(&self) -> &str {
        "choice"
    }

    fn convert(&self, value: Value, _: &Parameter, _: &Context<'_>) -> Result<Value, BadParameter> {
        let raw = value.to_string();

        match self.find(&raw) {
            Some(choice) => Ok(Value::Str(choice.to_owned())),
            None => Err(BadParameter::new(lazy_format!(
                "'{raw}' is not one of {}.",
                self.choices.iter().map(|choice| quoted(choice)).join_with(", ")
            ))),
        }
    }

    fn metavar(&self, _: &Parameter) -> Option<String> {
        Some(format!("[{}]", self.choices.iter().join_with("|")))
    }

    fn complete(&self, _: &Context<'_>, incomplete: &str) -> Vec<CompletionItem> {
        let matches = |choice: &&String| match self.case_sensitive {
            true => choice.starts_with(incomplete),
            false => choice
                .to_ascii_lowercase()
                .starts_with(&incomplete.to_ascii_lowercase()),
        };

        self.choices
            .iter()
            .filter(matches)
            .map(|choice| CompletionItem::plain(choice.as_str()))
            .collect()
    }
}

/// One end of a range
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound<T> {
    Unbounded,
    Closed(T),
    Open(T),
}

impl<T: Copy> Bound<T> {
    fn value(&self) -> Option<T> {
        match *self {
            Bound::Unbounded => None,
            Bound::Closed(x) | Bound::Open(x) => Some(x),
        }
    }
}

fn describe_range<T: fmt::Display + Copy>(min: Bound<T>, max: Bound<T>) -> String {
    let op = |bound: &Bound<T>| match bound {
        Bound::Open(_) => "<",
        _ => "<=",
    };

    match (min.value(), max.value()) {
        (Some(lo), Some(hi)) => format!("{lo}{}x{}{hi}", op(&min), op(&max)),
        (Some(lo), None) => format!("x{}{lo}", if op(&min) == "<" { ">" } else { ">=" }),
        (None, Some(hi)) => format!("x{}{hi}", op(&max)),
        (None, None) => String::new(),
    }
}

fn contains<T: PartialOrd + Copy>(min: Bound<T>, max: Bound<T>, x: T) -> bool {
    let above = match min {
        Bound::Unbounded => true,
        Bound::Closed(lo) => x >= lo,
        Bound::Open(lo) => x > lo,
    };

    let below = match max {
        Bound::Unbounded => true,
        Bound::Closed(hi) => x <= hi,
        Bound::Open(hi) => x < hi,
    };

    above && below
}

macro_rules! range_builders {
    ($type:ty) => {
        /// Values must be at least `min`
        #[must_use]
        pub fn min(self, min: $type) -> Self {
            Self {
                min: Bound::Closed(min),
                ..self
            }
        }

        /// Values must be at most `max`
        #[must_use]
        pub fn max(self, max: $type) -> Self {
            Self {
                max: Bound::Closed(max),
                ..self
            }
        }

        /// Values must be strictly greater than `min`
        #[must_use]
        pub fn min_open(self, min: $type) -> Self {
            Self {
                min: Bound::Open(min),
                ..self
            }
        }

        /// Values must be strictly less than `max`
        #[must_use]
        pub fn max_open(self, max: $type) -> Self {
            Self {
                max: Bound::Open(max),
                ..self
            }
        }

        /// Move out of range values to the nearest bound, instead of
        /// rejecting them
        #[must_use]
        pub fn clamp(self) -> Self {
            Self {
                clamp: true,
                ..self
            }
        }
    };
}

/// An integer within an inclusive or exclusive range
#[derive(Debug, Clone, Copy)]
pub struct IntRange {
    min: Bound<i64>,
    max: Bound<i64>,
    clamp: bool,
}

impl IntRange {
    /// A range from `min` to `max`, both inclusive
    #[must_use]
    pub fn new(min: i64, max: i64) -> Self {
        Self::unbounded().min(min).max(max)
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            min: Bound::Unbounded,
            max: Bound::Unbounded,
            clamp: false,
        }
    }

    range_builders!(i64);

    fn clamped(&self, x: i64) -> i64 {
        match (self.min, self.max) {
            (Bound::Closed(lo), _) if x < lo => lo,
            (Bound::Open(lo), _) if x <= lo => lo.saturating_add(1),
            (_, Bound::Closed(hi)) if x > hi => hi,
            (_, Bound::Open(hi)) if x >= hi => hi.saturating_sub(1),
            _ => x,
        }
    }
}

impl ParamType for IntRange {
    fn name(&self) -> &str {
        "integer range"
    }

    fn convert(&self, value: Value, _: &Parameter, _: &Context<'_>) -> Result<Value, BadParameter> {
        let x = parse_int(value)?;

        if contains(self.min, self.max, x) {
            Ok(Value::Int(x))
        } else if self.clamp {
            Ok(Value::Int(self.clamped(x)))
        } else {
            Err(BadParameter::new(lazy_format!(
                "{x} is not in the range {}.",
                describe_range(self.min, self.max)
            )))
        }
    }

    fn help_extra(&self) -> Option<String> {
        let range = describe_range(self.min, self.max);
        (!range.is_empty()).then_some(range)
    }
}

/// A float within an inclusive or exclusive range
#[derive(Debug, Clone, Copy)]
pub struct FloatRange {
    min: Bound<f64>,
    max: Bound<f64>,
    clamp: bool,
}

impl FloatRange {
    /// A range from `min` to `max`, both inclusive
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self::unbounded().min(min).max(max)
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            min: Bound::Unbounded,
            max: Bound::Unbounded,
            clamp: false,
        }
    }

    range_builders!(f64);
}

impl ParamType for FloatRange {
    fn name(&self) -> &str {
        "float range"
    }

    fn convert(&self, value: Value, _: &Parameter, _: &Context<'_>) -> Result<Value, BadParameter> {
        let x = parse_float(value)?;

        if contains(self.min, self.max, x) {
            Ok(Value::Float(x))
        } else if self.clamp {
            // Declaration checks guarantee both bounds are closed here
            let x = self.min.value().map_or(x, |lo| x.max(lo));
            let x = self.max.value().map_or(x, |hi| x.min(hi));
            Ok(Value::Float(x))
        } else {
            Err(BadParameter::new(lazy_format!(
                "{x} is not in the range {}.",
                describe_range(self.min, self.max)
            )))
        }
    }

    fn help_extra(&self) -> Option<String> {
        let range = describe_range(self.min, self.max);
        (!range.is_empty()).then_some(range)
    }

    fn check_declaration(&self) -> Result<(), String> {
        match (self.clamp, self.min, self.max) {
            (true, Bound::Open(_), _) | (true, _, Bound::Open(_)) => {
                Err("clamping is not supported for open bounds".to_owned())
            }
            _ => Ok(()),
        }
    }
}

/**
A fixed-arity group of values, each converted by its own type. A tuple
type fixes its parameter's `nargs` to the number of items.
 */
#[derive(Clone, Default)]
pub struct Tuple {
    items: Vec<TypeRef>,
}

impl Tuple {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next item's type
    #[must_use]
    pub fn then(mut self, item: impl ParamType + 'static) -> Self {
        self.items.push(Rc::new(item));
        self
    }

    fn names(&self) -> impl fmt::Display + '_ {
        self.items.iter().map(|item| item.name()).join_with(" ")
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl ParamType for Tuple {
    fn name(&self) -> &str {
        "tuple"
    }

    fn convert(
        &self,
        value: Value,
        param: &Parameter,
        ctx: &Context<'_>,
    ) -> Result<Value, BadParameter> {
        let items = match value {
            Value::Tuple(items) | Value::List(items) => items,
            value => {
                return Err(BadParameter::new(lazy_format!(
                    "'{value}' is not a valid <{}>.",
                    self.names()
                )));
            }
        };

        if items.len() != self.items.len() {
            return Err(takes_values(self.items.len(), items.len()));
        }

        self.items
            .iter()
            .zip(items)
            .map(|(ty, item)| ty.convert(item, param, ctx))
            .collect::<Result<_, _>>()
            .map(Value::Tuple)
    }

    fn metavar(&self, param: &Parameter) -> Option<String> {
        Some(
            self.items
                .iter()
                .map(|item| item.metavar(param).unwrap_or_else(|| item.name().to_uppercase()))
                .join_with(" ")
                .to_string(),
        )
    }

    fn arity(&self) -> Option<usize> {
        Some(self.items.len())
    }

    fn check_declaration(&self) -> Result<(), String> {
        match self.items.is_empty() {
            true => Err("a tuple type needs at least one item".to_owned()),
            false => self.items.iter().try_for_each(|item| item.check_declaration()),
        }
    }
}

/// A mis-sized group of values
pub(crate) fn takes_values(expected: usize, given: usize) -> BadParameter {
    BadParameter::new(lazy_format!(match (given) {
        1 => "Takes {expected} values but 1 was given.",
        _ => "Takes {expected} values but {given} were given.",
    }))
}

/// Pick a converter for a parameter declared without one, based on its
/// default value. Text is the fallback.
pub(crate) fn guess(default: Option<&Value>) -> TypeRef {
    match default {
        Some(Value::Int(_)) => Rc::new(Integer),
        Some(Value::Float(_)) => Rc::new(Float),
        Some(Value::Bool(_)) => Rc::new(Bool),
        Some(Value::Path(_)) => Rc::new(crate::path::PathType::new()),
        Some(Value::List(items)) => guess(items.first()),
        Some(Value::Tuple(items)) if !items.is_empty() => Rc::new(Tuple {
            items: items.iter().map(|item| guess(Some(item))).collect(),
        }),
        _ => Rc::new(Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        command::Command, context::Context, parameter::Opt, path::PathType, session::Session,
    };

    fn with_param(test: impl FnOnce(&Parameter, &Context<'_>)) {
        let command = Command::new("test")
            .param(Opt::new(["--value"]))
            .build()
            .unwrap();
        let ctx = Context::root(&command, "test", Session::testing().into_shared());
        test(&command.params()[0], &ctx);
    }

    #[test]
    fn bool_spellings() {
        with_param(|param, ctx| {
            for spelling in ["1", "TRUE", "t", "Yes", "y", "on"] {
                assert_eq!(
                    Bool.convert(Value::Str(spelling.into()), param, ctx),
                    Ok(Value::Bool(true))
                );
            }
            for spelling in ["0", "false", "F", "no", "N", "OFF"] {
                assert_eq!(
                    Bool.convert(Value::Str(spelling.into()), param, ctx),
                    Ok(Value::Bool(false))
                );
            }
            assert!(Bool.convert(Value::Str("maybe".into()), param, ctx).is_err());
        });
    }

    #[test]
    fn conversion_is_idempotent() {
        with_param(|param, ctx| {
            let samples: [(&dyn ParamType, Value); 5] = [
                (&Text, Value::Str("hi".into())),
                (&Integer, Value::Int(3)),
                (&Float, Value::Float(0.5)),
                (&Bool, Value::Bool(true)),
                (&Choice::new(["red", "blue"]), Value::Str("red".into())),
            ];

            for (ty, value) in samples {
                let once = ty.convert(value.clone(), param, ctx).unwrap();
                assert_eq!(once, value);
                assert_eq!(ty.convert(once, param, ctx).unwrap(), value);
            }
        });
    }

    #[test]
    fn converted_defaults_can_be_displayed() {
        with_param(|param, ctx| {
            let samples: [(&dyn ParamType, Value, &str); 9] = [
                (&Text, Value::Str("hi".into()), "hi"),
                (&Integer, Value::Str("7".into()), "7"),
                (&Float, Value::Int(2), "2"),
                (&Bool, Value::Str("yes".into()), "true"),
                (&Choice::new(["red"]), Value::Str("red".into()), "red"),
                (&IntRange::new(0, 9).clamp(), Value::Int(12), "9"),
                (&FloatRange::unbounded(), Value::Float(1.5), "1.5"),
                (&PathType::new(), Value::Str("notes/today.txt".into()), "notes/today.txt"),
                (
                    &Tuple::new().then(Text).then(Integer),
                    Value::Tuple(Vec::from([Value::Str("a".into()), Value::Str("1".into())])),
                    "a, 1",
                ),
            ];

            for (ty, default, shown) in samples {
                let converted = ty.convert(default, param, ctx).unwrap();
                assert_eq!(converted.to_string(), shown, "{ty:?}");
            }
        });
    }

    #[test]
    fn choice_returns_declared_casing() {
        with_param(|param, ctx| {
            let choice = Choice::new(["Red", "Blue"]).case_insensitive();
            assert_eq!(
                choice.convert(Value::Str("rED".into()), param, ctx),
                Ok(Value::Str("Red".into()))
            );

            let strict = Choice::new(["Red", "Blue"]);
            let error = strict
                .convert(Value::Str("red".into()), param, ctx)
                .unwrap_err();
            assert_eq!(error.message, "'red' is not one of 'Red', 'Blue'.");
        });
    }

    #[test]
    fn int_range_clamps_or_rejects() {
        with_param(|param, ctx| {
            let strict = IntRange::new(1, 5);
            assert_eq!(
                strict.convert(Value::Str("3".into()), param, ctx),
                Ok(Value::Int(3))
            );
            assert_eq!(
                strict
                    .convert(Value::Str("10".into()), param, ctx)
                    .unwrap_err()
                    .message,
                "10 is not in the range 1<=x<=5."
            );

            let clamped = IntRange::new(1, 5).clamp();
            assert_eq!(clamped.convert(Value::Int(10), param, ctx), Ok(Value::Int(5)));
            assert_eq!(clamped.convert(Value::Int(-4), param, ctx), Ok(Value::Int(1)));

            let open = IntRange::unbounded().min_open(0).max_open(10).clamp();
            assert_eq!(open.convert(Value::Int(0), param, ctx), Ok(Value::Int(1)));
            assert_eq!(open.convert(Value::Int(10), param, ctx), Ok(Value::Int(9)));
        });
    }

    #[test]
    fn float_range_clamp_needs_closed_bounds() {
        assert!(FloatRange::new(0.0, 1.0).clamp().check_declaration().is_ok());
        assert!(
            FloatRange::unbounded()
                .min_open(0.0)
                .clamp()
                .check_declaration()
                .is_err()
        );
    }

    #[test]
    fn range_descriptions() {
        assert_eq!(IntRange::new(1, 5).help_extra().as_deref(), Some("1<=x<=5"));
        assert_eq!(
            IntRange::unbounded().min_open(0).help_extra().as_deref(),
            Some("x>0")
        );
        assert_eq!(
            FloatRange::unbounded().max(2.5).help_extra().as_deref(),
            Some("x<=2.5")
        );
        assert_eq!(IntRange::unbounded().help_extra(), None);
    }

    #[test]
    fn tuples_convert_index_wise() {
        with_param(|param, ctx| {
            let ty = Tuple::new().then(Text).then(Integer);
            assert_eq!(
                ty.convert(
                    Value::Tuple(Vec::from([Value::Str("x".into()), Value::Str("2".into())])),
                    param,
                    ctx
                ),
                Ok(Value::Tuple(Vec::from([Value::Str("x".into()), Value::Int(2)])))
            );
            assert_eq!(
                ty.convert(Value::Tuple(Vec::from([Value::Str("x".into())])), param, ctx)
                    .unwrap_err()
                    .message,
                "Takes 2 values but 1 was given."
            );
            assert_eq!(ty.metavar(param).as_deref(), Some("TEXT INTEGER"));
        });
    }
}
