#![no_std]

/*!
Low-level implementation of argument tokenizing. Takes care of distinctions
between long options, short option clusters, positionals, and the `--`
separator. No type handling happens here, and the lexer never decides on its
own whether an option takes a value: that's up to the [`Visitor`], which
requests values through [`ArgAccess`]. Usually this is too low level to use
directly.
*/

mod populated_str;

use ::core::{
    fmt::{self, Debug},
    iter::Peekable,
};

use populated_str::PopulatedStr;

/**
A single, raw argument passed in from the command line.

This type is used in two ways: to indicate long command line options, and to
indicate arguments themselves. For instance, given
`--target foo --path=bar input.txt`, `target`, `foo`, `path`, `bar`, and
`input.txt` would all be passed as [`Arg`] values to the relevant functions.
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arg<'arg>(&'arg str);

impl<'arg> Arg<'arg> {
    #[inline]
    #[must_use]
    pub const fn new(arg: &'arg str) -> Self {
        Self(arg)
    }

    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'arg str {
        self.0
    }
}

impl Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl PartialEq<str> for Arg<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Arg<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/**
The [`ArgumentsParser`] type operates by passing arguments it finds into a
[`Visitor`], to be handled.
 */
pub trait Visitor<'arg> {
    type Value;

    /// A positional parameter. This includes a bare `-` and, usually,
    /// negative numbers like `-1` or `-3.5`.
    fn visit_positional(self, argument: Arg<'arg>) -> Self::Value;

    /// A long option that definitely has an argument, because it was given
    /// as `--option=argument`. The `option` excludes the leading `--`.
    fn visit_long_option(self, option: Arg<'arg>, argument: Arg<'arg>) -> Self::Value;

    /// A long option or flag, such as `--option`. The `option` excludes the
    /// leading `--`.
    fn visit_long(self, option: Arg<'arg>, arg: impl ArgAccess<'arg>) -> Self::Value;

    /// A short option or flag, such as `-o`. Clusters like `-abc` produce one
    /// call per letter, until one of the letters takes an argument.
    fn visit_short(self, option: char, arg: impl ArgAccess<'arg>) -> Self::Value;

    /**
    Negative numbers are positionals, unless this returns true. This is
    called with the whole token (like `-1`) before it's interpreted, and
    should return true only if a declared option is spelled exactly this way.
    */
    #[inline]
    #[expect(unused_variables)]
    fn claims_numeric(&self, token: Arg<'arg>) -> bool {
        false
    }
}

/**
[`ArgAccess`] allows a visitor to decide if a given parameter needs an argument,
based on the identity of the flag or option.

Consider `--foo bar`. Is this a pair of parameters (the flag `--foo` and the
positional parameter `bar`) or a single option `--foo bar` that takes an
argument? Similarly, `-ab foo` could be `-a b`, `foo`; or `-a`, `-b foo`; or
`-a`, `-b`, `foo`. The [`ArgumentsParser`] can't independently classify a given
argument, so instead, a visitor can request an argument via this trait only for
options that need them and the `ArgumentParser` takes care of the parsing logic
of actually determining where that argument comes from.
*/
pub trait ArgAccess<'arg>: Sized {
    /**
    Get an argument from the parser. This should only be called by options that
    need it; flags should simply ignore it, to ensure that the next command
    line argument can correctly be parsed independently.

    This returns [`None`] if all of the CLI arguments have been exhausted, or
    if there are known to only be positional parameters remaining (because
    a raw `--` was parsed at some point).
    */
    fn take(self) -> Option<Arg<'arg>>;

    /**
    Get an argument from the parser, but only if `predicate` accepts it.
    An argument attached to a short option (`-ovalue`) is always taken. If
    the predicate rejects the next argument, it's left in place to be parsed
    normally.
    */
    fn take_if(self, predicate: impl FnOnce(Arg<'arg>) -> bool) -> Option<Arg<'arg>>;

    /**
    Get up to `count` arguments from the parser, passing each one to `sink`.
    Returns the number of arguments that were actually delivered, which is
    less than `count` if the arguments ran out or hit a `--`.
    */
    fn take_many(self, count: usize, sink: impl FnMut(Arg<'arg>)) -> usize;
}

#[derive(Debug, Clone, Copy)]
enum State<'arg> {
    Ready,
    PositionalOnly,
    ShortInProgress(PopulatedStr<'arg>),
}

/**
An `ArgumentsParser` is the main entry point into `parley_lexer`. It parses
arguments in each call to `next_arg`, sending those arguments to the given
[`Visitor`]. It handles distinguishing flags, options, and positionals; logic
related to how flags get their argument values, and the `--` separator.

[parley-lexer][crate] operates entirely on borrowed data, because we assume
that command-line arguments can be loaded early on in `main` and then handled
in a borrowed form for the rest of the program. The ubiquitous `'arg` lifetime
refers to this borrowed command line data.
*/
#[derive(Debug, Clone)]
pub struct ArgumentsParser<'arg, I>
where
    I: Iterator<Item = &'arg str>,
{
    state: State<'arg>,
    args: Peekable<I>,
}

impl<'arg, I> ArgumentsParser<'arg, I>
where
    I: Iterator<Item = &'arg str>,
{
    /**
    Create a new [`ArgumentsParser`] from an iterator of string slices, where
    each slice is a single argument received from the command line. This
    list should *exclude* the name of the program, which is commonly passed as
    the first argument in the list.
     */
    #[inline]
    #[must_use]
    pub fn new(args: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            state: State::Ready,
            args: args.into_iter().peekable(),
        }
    }

    /// True if a `--` has been seen, so that everything remaining will be
    /// treated as a positional.
    #[inline]
    #[must_use]
    pub fn is_positional_only(&self) -> bool {
        matches!(self.state, State::PositionalOnly)
    }

    /**
    Stop parsing and get all of the raw arguments that haven't been visited
    yet. This must not be called in the middle of a short option cluster;
    the remainder of the cluster would be lost.
     */
    #[inline]
    #[must_use]
    pub fn into_remaining(self) -> Peekable<I> {
        debug_assert!(!matches!(self.state, State::ShortInProgress(_)));
        self.args
    }

    /// Put `self` into a `PositionalOnly` state, then process a positional
    /// argument
    #[inline]
    fn positional_only_arg<V>(&mut self, visitor: V) -> Option<V::Value>
    where
        V: Visitor<'arg>,
    {
        debug_assert!(!matches!(self.state, State::ShortInProgress(_)));

        self.state = State::PositionalOnly;
        self.args
            .next()
            .map(Arg)
            .map(|arg| visitor.visit_positional(arg))
    }

    /// Put `self` into a `Ready` state, then return a StandardArgAccess
    #[inline]
    fn standard_arg(&mut self) -> StandardArgAccess<'_, 'arg, I> {
        debug_assert!(!matches!(self.state, State::PositionalOnly));

        self.state = State::Ready;
        StandardArgAccess { parent: self }
    }

    /// Put `self` into a `ShortInProgress` state, then return a
    /// ShortArgAccess.
    #[inline]
    fn short_arg(&mut self, short: PopulatedStr<'arg>) -> ShortArgAccess<'_, 'arg, I> {
        debug_assert!(!matches!(self.state, State::PositionalOnly));

        self.state = State::ShortInProgress(short);
        ShortArgAccess {
            short: short.get(),
            parent: self,
        }
    }

    /// Handle getting the argument for a `-s` short option. If there is
    /// remaining content in the cluster, it's a candidate for the argument;
    /// otherwise, the next argument in the input args is the candidate.
    #[inline]
    fn handle_short_argument<V>(&mut self, short: PopulatedStr<'arg>, visitor: V) -> V::Value
    where
        V: Visitor<'arg>,
    {
        let (option, short) = short.split_first();

        match PopulatedStr::new(short) {
            None => visitor.visit_short(option, self.standard_arg()),
            Some(short) => visitor.visit_short(option, self.short_arg(short)),
        }
    }

    pub fn next_arg<V>(&mut self, visitor: V) -> Option<V::Value>
    where
        V: Visitor<'arg>,
    {
        match self.state {
            State::Ready => match self.args.next()? {
                "--" => self.positional_only_arg(visitor),
                argument => Some(match argument.strip_prefix("--") {
                    Some(option) => match split_once(option, b'=') {
                        Some((option, argument)) => {
                            visitor.visit_long_option(Arg(option), Arg(argument))
                        }
                        None => visitor.visit_long(Arg(option), self.standard_arg()),
                    },
                    None => match argument.strip_prefix('-').and_then(PopulatedStr::new) {
                        None => visitor.visit_positional(Arg(argument)),
                        Some(_)
                            if is_negative_number(argument)
                                && !visitor.claims_numeric(Arg(argument)) =>
                        {
                            visitor.visit_positional(Arg(argument))
                        }
                        Some(short) => self.handle_short_argument(short, visitor),
                    },
                }),
            },
            State::PositionalOnly => self.positional_only_arg(visitor),
            State::ShortInProgress(short) => Some(self.handle_short_argument(short, visitor)),
        }
    }
}

/// ArgAccess implementation that gets the next argument from the list.
/// Handles logic around `--` PositionalOnly parameters.
struct StandardArgAccess<'a, 'arg, I>
where
    I: Iterator<Item = &'arg str>,
{
    parent: &'a mut ArgumentsParser<'arg, I>,
}

impl<'arg, I> StandardArgAccess<'_, 'arg, I>
where
    I: Iterator<Item = &'arg str>,
{
    /// Get the next argument, unless it's a `--`, in which case switch to
    /// PositionalOnly and return None.
    #[inline]
    fn next(&mut self) -> Option<Arg<'arg>> {
        match self.parent.args.next()? {
            "--" if !matches!(self.parent.state, State::PositionalOnly) => {
                self.parent.state = State::PositionalOnly;
                None
            }
            arg => Some(Arg(arg)),
        }
    }
}

impl<'arg, I> ArgAccess<'arg> for StandardArgAccess<'_, 'arg, I>
where
    I: Iterator<Item = &'arg str>,
{
    fn take(mut self) -> Option<Arg<'arg>> {
        self.next()
    }

    fn take_if(self, predicate: impl FnOnce(Arg<'arg>) -> bool) -> Option<Arg<'arg>> {
        // A `--` is never an argument; it's left for the main loop, which
        // will switch to PositionalOnly.
        let &next = self.parent.args.peek()?;

        match next != "--" && predicate(Arg(next)) {
            true => self.parent.args.next().map(Arg),
            false => None,
        }
    }

    fn take_many(mut self, count: usize, mut sink: impl FnMut(Arg<'arg>)) -> usize {
        let mut delivered = 0;

        while delivered < count {
            match self.next() {
                None => break,
                Some(arg) => sink(arg),
            }
            delivered += 1;
        }

        delivered
    }
}

/// ArgAccess implementation that gets the remainder of a short argument.
/// Handles things like `-ovalue`, which is equivalent to `-o value`.
struct ShortArgAccess<'a, 'arg, I>
where
    I: Iterator<Item = &'arg str>,
{
    short: &'arg str,
    parent: &'a mut ArgumentsParser<'arg, I>,
}

impl<'arg, I> ArgAccess<'arg> for ShortArgAccess<'_, 'arg, I>
where
    I: Iterator<Item = &'arg str>,
{
    fn take(self) -> Option<Arg<'arg>> {
        debug_assert!(
            matches!(self.parent.state, State::ShortInProgress(short) if short.get() == self.short)
        );

        self.parent.state = State::Ready;
        Some(Arg(self.short))
    }

    fn take_if(self, _predicate: impl FnOnce(Arg<'arg>) -> bool) -> Option<Arg<'arg>> {
        self.take()
    }

    fn take_many(self, count: usize, mut sink: impl FnMut(Arg<'arg>)) -> usize {
        if count == 0 {
            return 0;
        }

        let short = self.short;
        let parent = self.parent;

        parent.state = State::Ready;
        sink(Arg(short));

        1 + StandardArgAccess { parent }.take_many(count - 1, sink)
    }
}

fn split_once(input: &str, delimiter: u8) -> Option<(&str, &str)> {
    // The delimiter is always ascii, so these indexes are on char boundaries
    memchr::memchr(delimiter, input.as_bytes()).map(|i| (&input[..i], &input[i + 1..]))
}

/// Check if an argument looks like `-1`, `-3.5`, or `-.5`
fn is_negative_number(argument: &str) -> bool {
    match argument.strip_prefix('-') {
        None => false,
        Some(number) => {
            matches!(number.as_bytes().first(), Some(b'0'..=b'9' | b'.'))
                && number.parse::<f64>().is_ok()
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::{format, string::String, vec, vec::Vec};

    use super::*;

    /// Records a description of each token. The option names in `valued` take
    /// one argument; everything else is a flag.
    struct Recorder<'a> {
        out: &'a mut Vec<String>,
        valued: &'a [&'a str],
        numeric: &'a [&'a str],
    }

    impl<'arg> Visitor<'arg> for Recorder<'_> {
        type Value = ();

        fn visit_positional(self, argument: Arg<'arg>) {
            self.out.push(format!("pos:{}", argument.as_str()));
        }

        fn visit_long_option(self, option: Arg<'arg>, argument: Arg<'arg>) {
            self.out
                .push(format!("long:{}={}", option.as_str(), argument.as_str()));
        }

        fn visit_long(self, option: Arg<'arg>, arg: impl ArgAccess<'arg>) {
            let name = format!("--{}", option.as_str());
            match self.valued.contains(&name.as_str()) {
                true => match arg.take() {
                    Some(value) => self.out.push(format!("long:{}={}", option.as_str(), value.as_str())),
                    None => self.out.push(format!("long:{}=<missing>", option.as_str())),
                },
                false => self.out.push(format!("flag:{}", option.as_str())),
            }
        }

        fn visit_short(self, option: char, arg: impl ArgAccess<'arg>) {
            let name = format!("-{option}");
            match self.valued.contains(&name.as_str()) {
                true => match arg.take() {
                    Some(value) => self.out.push(format!("short:{option}={}", value.as_str())),
                    None => self.out.push(format!("short:{option}=<missing>")),
                },
                false => self.out.push(format!("short:{option}")),
            }
        }

        fn claims_numeric(&self, token: Arg<'arg>) -> bool {
            self.numeric.contains(&token.as_str())
        }
    }

    fn lex(args: &[&str], valued: &[&str], numeric: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        let mut parser = ArgumentsParser::new(args.iter().copied());

        while let Some(()) = parser.next_arg(Recorder {
            out: &mut out,
            valued,
            numeric,
        }) {}

        out
    }

    #[test]
    fn long_options_split_at_the_first_equals() {
        assert_eq!(
            lex(&["--name=a=b", "--count", "3"], &["--count"], &[]),
            vec!["long:name=a=b", "long:count=3"]
        );
    }

    #[test]
    fn short_cluster_stops_at_the_first_valued_option() {
        assert_eq!(
            lex(&["-abcvalue", "rest"], &["-c"], &[]),
            vec!["short:a", "short:b", "short:c=value", "pos:rest"]
        );
    }

    #[test]
    fn short_option_takes_the_next_argument() {
        assert_eq!(
            lex(&["-c", "value"], &["-c"], &[]),
            vec!["short:c=value"]
        );
    }

    #[test]
    fn double_dash_makes_everything_positional() {
        assert_eq!(
            lex(&["-a", "--", "-b", "--", "--long"], &[], &[]),
            vec!["short:a", "pos:-b", "pos:--", "pos:--long"]
        );
    }

    #[test]
    fn double_dash_is_never_an_option_argument() {
        assert_eq!(
            lex(&["--name", "--", "--name"], &["--name"], &[]),
            vec!["long:name=<missing>", "pos:--name"]
        );
    }

    #[test]
    fn bare_dash_is_positional() {
        assert_eq!(lex(&["-", "-a"], &[], &[]), vec!["pos:-", "short:a"]);
    }

    #[test]
    fn negative_numbers_are_positional() {
        assert_eq!(
            lex(&["-1", "-3.5", "-.5", "-x1"], &[], &[]),
            vec!["pos:-1", "pos:-3.5", "pos:-.5", "short:x", "short:1"]
        );
    }

    #[test]
    fn declared_numeric_options_win() {
        assert_eq!(
            lex(&["-1", "-2"], &[], &["-1"]),
            vec!["short:1", "pos:-2"]
        );
    }

    #[test]
    fn take_if_leaves_rejected_arguments() {
        struct Optional<'a>(&'a mut Vec<String>);

        impl<'arg> Visitor<'arg> for Optional<'_> {
            type Value = ();

            fn visit_positional(self, argument: Arg<'arg>) {
                self.0.push(format!("pos:{}", argument.as_str()));
            }

            fn visit_long_option(self, _: Arg<'arg>, _: Arg<'arg>) {}

            fn visit_long(self, option: Arg<'arg>, arg: impl ArgAccess<'arg>) {
                let value = arg.take_if(|arg| !arg.as_str().starts_with('-'));
                self.0.push(format!("{}:{:?}", option.as_str(), value));
            }

            fn visit_short(self, _: char, _: impl ArgAccess<'arg>) {}
        }

        let mut out = Vec::new();
        let args = ["--name", "--other", "x", "--other"];
        let mut parser = ArgumentsParser::new(args.iter().copied());
        while let Some(()) = parser.next_arg(Optional(&mut out)) {}

        assert_eq!(
            out,
            vec!["name:None", "other:Some(\"x\")", "other:None"]
        );
    }

    #[test]
    fn take_many_uses_the_attached_value_first() {
        struct Pair<'a>(&'a mut Vec<String>);

        impl<'arg> Visitor<'arg> for Pair<'_> {
            type Value = ();

            fn visit_positional(self, argument: Arg<'arg>) {
                self.0.push(format!("pos:{}", argument.as_str()));
            }

            fn visit_long_option(self, _: Arg<'arg>, _: Arg<'arg>) {}

            fn visit_long(self, _: Arg<'arg>, _: impl ArgAccess<'arg>) {}

            fn visit_short(self, option: char, arg: impl ArgAccess<'arg>) {
                let mut values = Vec::new();
                let count = arg.take_many(2, |value| values.push(value.as_str()));
                self.0.push(format!("{option}:{count}:{values:?}"));
            }
        }

        let mut out = Vec::new();
        let args = ["-p1", "2", "3", "-q", "4"];
        let mut parser = ArgumentsParser::new(args.iter().copied());
        while let Some(()) = parser.next_arg(Pair(&mut out)) {}

        assert_eq!(
            out,
            vec!["p:2:[\"1\", \"2\"]", "pos:3", "q:1:[\"4\"]"]
        );
    }

    #[test]
    fn into_remaining_returns_unvisited_arguments() {
        let args = ["a", "--b", "c"];
        let mut parser = ArgumentsParser::new(args.iter().copied());
        let mut out = Vec::new();

        parser.next_arg(Recorder {
            out: &mut out,
            valued: &[],
            numeric: &[],
        });

        let rest: Vec<&str> = parser.into_remaining().collect();
        assert_eq!(out, vec!["pos:a"]);
        assert_eq!(rest, vec!["--b", "c"]);
    }
}
