/*!
The per-invocation [`Context`], and the resolved parameter values it holds.

Contexts form a chain from the innermost subcommand up to the root. Each one
borrows its parent, so a parent always outlives its children and descendants
can read, but never take ownership of, ancestor state. The shared object and
the `meta` map are reference counted and shared down the chain; they use
`RefCell`, so a context tree is confined to a single thread.
 */

use std::{
    any::Any,
    cell::{Cell, Ref, RefCell},
    collections::{BTreeMap, HashMap},
    fmt::{self, Display},
    rc::Rc,
};

use crate::{
    command::Command,
    config::DefaultMap,
    environment::{self, Environment},
    errors::{Error, UsageHint},
    help,
    session::Session,
    value::{FromValue, Value},
};

/// Which step of the resolution pipeline produced a parameter's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterSource {
    CommandLine,
    Environment,
    DefaultMap,
    Default,
    Prompt,
}

/// Resolved parameter values, keyed by canonical identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues {
    values: BTreeMap<String, Value>,
}

impl ParamValues {
    /// Get a value as a specific type. Returns `None` if the parameter
    /// doesn't exist or its value doesn't have that shape.
    #[must_use]
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.values.get(name).and_then(T::from_value)
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }
}

/// Settings that only the root of a context tree receives from outside
#[derive(Default)]
pub(crate) struct RootSettings {
    pub default_map: Option<Rc<DefaultMap>>,
    pub auto_envvar_prefix: Option<String>,
    pub obj: Option<Rc<dyn Any>>,
    pub resilient: bool,
}

type Meta = HashMap<String, Box<dyn Any>>;

pub struct Context<'a> {
    command: &'a Command,
    parent: Option<&'a Context<'a>>,
    info_name: String,
    session: Rc<Session>,

    params: RefCell<ParamValues>,
    sources: RefCell<HashMap<String, ParameterSource>>,
    args: RefCell<Vec<String>>,
    invoked_subcommand: RefCell<Option<String>>,

    obj: RefCell<Option<Rc<dyn Any>>>,
    meta: Rc<RefCell<Meta>>,
    default_map: Option<Rc<DefaultMap>>,

    auto_envvar_prefix: Option<String>,
    show_default: bool,
    max_content_width: usize,
    resilient: bool,

    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    closed: Cell<bool>,
}

const DEFAULT_CONTENT_WIDTH: usize = 80;

impl<'a> Context<'a> {
    /// Create the root context for an invocation of `command`.
    pub fn root(command: &'a Command, info_name: impl Into<String>, session: Rc<Session>) -> Self {
        Self::root_with(command, info_name.into(), session, RootSettings::default())
    }

    pub(crate) fn root_with(
        command: &'a Command,
        info_name: String,
        session: Rc<Session>,
        settings: RootSettings,
    ) -> Self {
        let settings_of = command.settings();

        tracing::debug!(command = %info_name, "creating root context");

        Self {
            command,
            parent: None,
            session,
            params: RefCell::default(),
            sources: RefCell::default(),
            args: RefCell::default(),
            invoked_subcommand: RefCell::default(),
            obj: RefCell::new(settings.obj),
            meta: Rc::default(),
            default_map: settings.default_map,
            auto_envvar_prefix: settings_of
                .auto_envvar_prefix
                .clone()
                .or(settings.auto_envvar_prefix),
            show_default: settings_of.show_default.unwrap_or(false),
            max_content_width: settings_of
                .max_content_width
                .unwrap_or(DEFAULT_CONTENT_WIDTH),
            resilient: settings.resilient,
            cleanups: RefCell::default(),
            closed: Cell::new(false),
            info_name,
        }
    }

    /// Create the context for a subcommand of the command that owns `parent`.
    /// `info_name` is the name the subcommand was invoked as.
    pub fn child(parent: &'a Context<'a>, command: &'a Command, info_name: impl Into<String>) -> Self {
        let info_name = info_name.into();
        let settings = command.settings();

        tracing::debug!(
            command = %info_name,
            parent = %parent.info_name,
            "creating child context"
        );

        Self {
            command,
            parent: Some(parent),
            session: Rc::clone(&parent.session),
            params: RefCell::default(),
            sources: RefCell::default(),
            args: RefCell::default(),
            invoked_subcommand: RefCell::default(),
            obj: RefCell::new(parent.obj.borrow().clone()),
            meta: Rc::clone(&parent.meta),
            default_map: parent
                .default_map
                .as_deref()
                .and_then(|map| map.get_map(&info_name)),
            auto_envvar_prefix: match &settings.auto_envvar_prefix {
                Some(prefix) => Some(prefix.clone()),
                None => parent
                    .auto_envvar_prefix
                    .as_deref()
                    .map(|prefix| environment::env_name([prefix, info_name.as_str()])),
            },
            show_default: settings.show_default.unwrap_or(parent.show_default),
            max_content_width: settings
                .max_content_width
                .unwrap_or(parent.max_content_width),
            resilient: parent.resilient,
            cleanups: RefCell::default(),
            closed: Cell::new(false),
            info_name,
        }
    }

    #[inline]
    #[must_use]
    pub fn command(&self) -> &'a Command {
        self.command
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    /// The name this command was invoked as
    #[inline]
    #[must_use]
    pub fn info_name(&self) -> &str {
        &self.info_name
    }

    /// The outermost context in the chain
    #[must_use]
    pub fn find_root(&self) -> &Context<'a> {
        let mut ctx = self;
        while let Some(parent) = ctx.parent {
            ctx = parent;
        }
        ctx
    }

    /// Iterate this context and all of its ancestors, innermost first
    pub fn ancestors(&self) -> impl Iterator<Item = &Context<'a>> {
        std::iter::successors(Some(self), |ctx| ctx.parent)
    }

    /// The invocation names from the root to here, like `git remote add`
    #[must_use]
    pub fn command_path(&self) -> String {
        match self.parent {
            None => self.info_name.clone(),
            Some(parent) => format!("{} {}", parent.command_path(), self.info_name),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn env(&self) -> &dyn Environment {
        self.session.env()
    }

    /// Write a line of text to the output
    pub fn echo(&self, text: impl Display) -> Result<(), Error> {
        self.session.output().write(&format!("{text}\n"))?;
        Ok(())
    }

    /// Write a line of text to the error output
    pub fn echo_err(&self, text: impl Display) -> Result<(), Error> {
        self.session.error_output().write(&format!("{text}\n"))?;
        Ok(())
    }

    // Resolved values

    /// All of this command's resolved parameter values
    pub fn params(&self) -> Ref<'_, ParamValues> {
        self.params.borrow()
    }

    /// A resolved parameter value, as a specific type
    #[must_use]
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.params.borrow().get(name)
    }

    /// A resolved parameter value
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.params.borrow().value(name).cloned()
    }

    pub(crate) fn set_value(&self, name: &str, value: Value) {
        self.params.borrow_mut().insert(name.to_owned(), value);
    }

    /// Which pipeline step produced a parameter's value. `None` if the
    /// parameter doesn't exist, hasn't been resolved yet, or resolved to
    /// its empty value.
    #[must_use]
    pub fn get_parameter_source(&self, name: &str) -> Option<ParameterSource> {
        self.sources.borrow().get(name).copied()
    }

    pub(crate) fn set_parameter_source(&self, name: &str, source: ParameterSource) {
        self.sources.borrow_mut().insert(name.to_owned(), source);
    }

    /// Tokens left over after this command's own parameters were parsed
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        self.args.borrow().clone()
    }

    pub(crate) fn set_args(&self, args: Vec<String>) {
        *self.args.borrow_mut() = args;
    }

    pub(crate) fn take_args(&self) -> Vec<String> {
        self.args.take()
    }

    /// The name of the subcommand about to run, while a group's own handler
    /// runs. `*` for a chained group.
    #[must_use]
    pub fn invoked_subcommand(&self) -> Option<String> {
        self.invoked_subcommand.borrow().clone()
    }

    pub(crate) fn set_invoked_subcommand(&self, name: impl Into<String>) {
        *self.invoked_subcommand.borrow_mut() = Some(name.into());
    }

    /// True while resolving for completion: no prompts, callbacks, or
    /// handlers, and errors are swallowed.
    #[inline]
    #[must_use]
    pub fn resilient_parsing(&self) -> bool {
        self.resilient
    }

    #[must_use]
    pub fn auto_envvar_prefix(&self) -> Option<&str> {
        self.auto_envvar_prefix.as_deref()
    }

    #[must_use]
    pub fn show_default(&self) -> bool {
        self.show_default
    }

    #[must_use]
    pub fn max_content_width(&self) -> usize {
        self.max_content_width
    }

    #[must_use]
    pub fn default_map(&self) -> Option<&DefaultMap> {
        self.default_map.as_deref()
    }

    /// The override for a parameter's default in this command's part of
    /// the default map
    #[must_use]
    pub fn lookup_default(&self, name: &str) -> Option<Value> {
        self.default_map.as_deref()?.get(name).cloned()
    }

    // Shared state

    /// The nearest shared object of type `T`, searching up the chain.
    #[must_use]
    pub fn find_object<T: 'static>(&self) -> Option<Rc<RefCell<T>>> {
        self.ancestors().find_map(|ctx| {
            let obj = ctx.obj.borrow().clone()?;
            obj.downcast::<RefCell<T>>().ok()
        })
    }

    /// The nearest shared object of type `T`; if there isn't one, a default
    /// one is created and attached to this context.
    pub fn ensure_object<T: Default + 'static>(&self) -> Rc<RefCell<T>> {
        match self.find_object() {
            Some(obj) => obj,
            None => self.set_object(T::default()),
        }
    }

    /// Attach a shared object to this context. Subcommand contexts created
    /// afterwards inherit it.
    pub fn set_object<T: 'static>(&self, obj: T) -> Rc<RefCell<T>> {
        let obj = Rc::new(RefCell::new(obj));
        *self.obj.borrow_mut() = Some(Rc::clone(&obj) as Rc<dyn Any>);
        obj
    }

    /// A map shared by every context in the tree
    #[must_use]
    pub fn meta(&self) -> &RefCell<HashMap<String, Box<dyn Any>>> {
        &self.meta
    }

    // Failures

    /// A usage error, reported against this command
    #[must_use]
    pub fn fail(&self, message: impl Display) -> Error {
        Error::usage(message).with_hint(|| self.usage_hint())
    }

    #[must_use]
    pub fn abort(&self) -> Error {
        Error::Abort
    }

    #[must_use]
    pub fn exit(&self, code: i32) -> Error {
        Error::Exit(code)
    }

    pub(crate) fn usage_hint(&self) -> UsageHint {
        UsageHint {
            command_path: self.command_path(),
            usage: help::usage_pieces(self),
            help_option: self.command.help_option_names().first().cloned(),
        }
    }

    /// Render this command's help text
    #[must_use]
    pub fn get_help(&self) -> String {
        help::format_help(self)
    }

    /// Write this command's help text to the output
    pub fn write_help(&self) -> Result<(), Error> {
        self.session.output().write(&self.get_help())?;
        Ok(())
    }

    // Cleanup

    /// Register a function to run when this context closes. Cleanups run in
    /// reverse registration order. If the context is already closed, `f`
    /// runs immediately.
    pub fn call_on_close(&self, f: impl FnOnce() + 'static) {
        match self.closed.get() {
            true => f(),
            false => self.cleanups.borrow_mut().push(Box::new(f)),
        }
    }

    /**
    Keep a resource alive until this context closes. Several contexts can
    hold the same resource; it's released once, when the last of them
    closes.
     */
    pub fn with_resource<T: 'static>(&self, resource: Rc<T>) -> Rc<T> {
        let held = Rc::clone(&resource);
        self.call_on_close(move || drop(held));
        resource
    }

    /// Run this context's cleanups. Happens automatically when the context
    /// is dropped; closing twice does nothing.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }

        let cleanups = self.cleanups.take();
        tracing::debug!(
            command = %self.info_name,
            cleanups = cleanups.len(),
            "closing context"
        );

        cleanups.into_iter().rev().for_each(|cleanup| cleanup());
    }
}

impl Drop for Context<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("info_name", &self.info_name)
            .field("parent", &self.parent.map(|parent| &parent.info_name))
            .field("params", &*self.params.borrow())
            .field("args", &*self.args.borrow())
            .field("resilient", &self.resilient)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    fn session() -> Rc<Session> {
        Session::testing().into_shared()
    }

    #[test]
    fn cleanups_run_in_reverse_once() {
        let command = Command::new("root").build().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        {
            let ctx = Context::root(&command, "root", session());
            for i in 0..3 {
                let log = Rc::clone(&log);
                ctx.call_on_close(move || log.borrow_mut().push(i));
            }
            ctx.close();
            ctx.close();

            let log2 = Rc::clone(&log);
            ctx.call_on_close(move || log2.borrow_mut().push(99));
        }

        assert_eq!(*log.borrow(), [2, 1, 0, 99]);
    }

    #[test]
    fn shared_resources_are_released_once_by_the_outermost_context() {
        struct Resource(Rc<RefCell<Vec<&'static str>>>);

        impl Drop for Resource {
            fn drop(&mut self) {
                self.0.borrow_mut().push("released");
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let command = Command::new("root").build().unwrap();
        let resource = Rc::new(Resource(Rc::clone(&log)));

        let root = Context::root(&command, "root", session());
        root.with_resource(Rc::clone(&resource));
        {
            let child = Context::child(&root, &command, "child");
            child.with_resource(Rc::clone(&resource));
        }
        drop(resource);

        assert!(log.borrow().is_empty());
        drop(root);
        assert_eq!(*log.borrow(), ["released"]);
    }

    #[test]
    fn objects_are_found_up_the_chain() {
        let command = Command::new("root").build().unwrap();
        let root = Context::root(&command, "root", session());
        root.set_object(vec![1, 2]);

        let child = Context::child(&root, &command, "child");
        let obj = child.find_object::<Vec<i32>>().unwrap();
        obj.borrow_mut().push(3);

        assert_eq!(*root.find_object::<Vec<i32>>().unwrap().borrow(), [1, 2, 3]);
        assert!(child.find_object::<String>().is_none());

        let counter = child.ensure_object::<u32>();
        *counter.borrow_mut() += 1;
        assert_eq!(*child.ensure_object::<u32>().borrow(), 1);
        assert!(root.find_object::<u32>().is_none());
    }

    #[test]
    fn meta_is_shared_by_the_whole_tree() {
        let command = Command::new("root").build().unwrap();
        let root = Context::root(&command, "root", session());
        let child = Context::child(&root, &command, "child");
        let grandchild = Context::child(&child, &command, "leaf");

        grandchild
            .meta()
            .borrow_mut()
            .insert("seen".into(), Box::new(true));

        let meta = root.meta().borrow();
        assert_eq!(meta.get("seen").and_then(|v| v.downcast_ref::<bool>()), Some(&true));
        assert_eq!(grandchild.command_path(), "root child leaf");
        assert_eq!(grandchild.find_root().info_name(), "root");
    }

    #[test]
    fn child_contexts_inherit_the_environment_prefix_and_default_map() {
        let command = Command::new("root").build().unwrap();
        let root = Context::root_with(
            &command,
            "tool".into(),
            session(),
            RootSettings {
                auto_envvar_prefix: Some("TOOL".into()),
                default_map: Some(Rc::new(
                    DefaultMap::new().subcommand("sync-all", DefaultMap::new().value("n", 3)),
                )),
                ..RootSettings::default()
            },
        );
        let child = Context::child(&root, &command, "sync-all");

        assert_eq!(child.auto_envvar_prefix(), Some("TOOL_SYNC_ALL"));
        assert_eq!(child.lookup_default("n"), Some(Value::Int(3)));
        assert_eq!(root.lookup_default("n"), None);
    }
}
