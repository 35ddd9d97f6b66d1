//! Registered commands: a parser for the syntax, an action for the effect.

use arbiter_protocol::SlotId;

use crate::{ArgReader, StageContext};

/// Who sent a request, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub slot: SlotId,
    /// `true` when the request arrived in the group channel.
    pub is_public: bool,
}

type Handler<S, G, R> =
    Box<dyn Fn(&mut S, &mut G, &mut StageContext<'_>, Caller, &str) -> Option<R> + Send + Sync>;

/// One command a stage understands.
///
/// `S` is the stage type, `G` the game state shared by the whole tree and
/// `R` the result type of the stage kind ([`ActionResult`](crate::ActionResult)
/// for leaves, [`ControlResult`](crate::ControlResult) for composites).
///
/// The parser sees only the text. If it returns `None`, or leaves tokens
/// unread, the command does not match and the next one is tried. Only a
/// matching command runs its action, so trying commands has no side
/// effects.
pub struct Command<S, G, R> {
    description: String,
    handler: Handler<S, G, R>,
}

impl<S: 'static, G: 'static, R: 'static> Command<S, G, R> {
    pub fn description(&self) -> &str {
        &self.description
    }

    fn try_run(
        &self,
        stage: &mut S,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        caller: Caller,
        text: &str,
    ) -> Option<R> {
        (self.handler)(stage, game, ctx, caller, text)
    }
}

/// The commands of one stage, in priority order.
///
/// Stages fill it in `commands()`:
///
/// ```rust,ignore
/// fn commands(c: &mut Commands<Self, Board, ActionResult>) {
///     c.add("pick <n>", |r| { r.keyword("pick")?; r.parse::<i64>() }, |_, board, _, caller, n| {
///         board.picks[caller.slot.index()] = Some(n);
///         ActionResult::Ready
///     });
/// }
/// ```
pub struct Commands<S, G, R> {
    list: Vec<Command<S, G, R>>,
}

impl<S: 'static, G: 'static, R: 'static> Commands<S, G, R> {
    pub(crate) fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Registers a command after the ones already added.
    pub fn add<A, P, F>(&mut self, description: impl Into<String>, parse: P, action: F) -> &mut Self
    where
        A: 'static,
        P: Fn(&mut ArgReader<'_>) -> Option<A> + Send + Sync + 'static,
        F: Fn(&mut S, &mut G, &mut StageContext<'_>, Caller, A) -> R + Send + Sync + 'static,
    {
        let handler: Handler<S, G, R> = Box::new(move |stage, game, ctx, caller, text| {
            let mut reader = ArgReader::new(text);
            let args = parse(&mut reader)?;
            if !reader.is_empty() {
                return None;
            }
            Some(action(stage, game, ctx, caller, args))
        });
        self.list.push(Command {
            description: description.into(),
            handler,
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command<S, G, R>> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Tries the commands in order; the first match wins.
    pub(crate) fn dispatch(
        &self,
        stage: &mut S,
        game: &mut G,
        ctx: &mut StageContext<'_>,
        caller: Caller,
        text: &str,
    ) -> Option<R> {
        self.list
            .iter()
            .find_map(|command| command.try_run(stage, game, ctx, caller, text))
    }
}
