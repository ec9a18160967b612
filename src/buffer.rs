//! Buffer policy: where the engine's working buffer comes from.
//!
//! Two variants, selected statically by the caller rather than detected by
//! introspecting the handler (Rust has no SFINAE-style "has member"
//! detection without nightly specialization; Design Note (a) already
//! prefers explicit tag-dispatched types over that machinery). An
//! [`ArenaPolicy`] allocates and reuses one internal buffer; a
//! [`PassThroughPolicy`] delegates to a handler that implements
//! [`BufferOwner`].

use log::trace;

use crate::chars::CodeUnit;
use crate::error::ParseError;
use crate::handler::BufferOwner;

/// Default buffer size in code units, matching
/// `original_source`'s `default_buffer_control` (`buffer_size < 1 ? 8192 :
/// buffer_size`).
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Supplies and reclaims the engine's working buffer.
pub trait BufferPolicy<Ch: CodeUnit, H: ?Sized> {
    /// Hands the engine a fresh buffer of at least 2 units.
    fn get_buffer(&mut self, handler: &mut H) -> Result<Vec<Ch>, ParseError>;

    /// Returns a buffer the engine has finished consuming.
    fn release_buffer(&mut self, handler: &mut H, buffer: Vec<Ch>);
}

/// Allocates one buffer lazily on first use and reuses it for the life of
/// the policy (the engine only ever has one buffer checked out at a time).
/// `preferred_size` is clamped to at least 2 units.
pub struct ArenaPolicy<Ch> {
    preferred_size: usize,
    spare: Option<Vec<Ch>>,
}

impl<Ch: CodeUnit> ArenaPolicy<Ch> {
    pub fn new(preferred_size: usize) -> Self {
        Self { preferred_size: preferred_size.max(2), spare: None }
    }
}

impl<Ch: CodeUnit> Default for ArenaPolicy<Ch> {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl<Ch: CodeUnit, H: ?Sized> BufferPolicy<Ch, H> for ArenaPolicy<Ch> {
    fn get_buffer(&mut self, _handler: &mut H) -> Result<Vec<Ch>, ParseError> {
        Ok(self.spare.take().unwrap_or_else(|| {
            trace!("arena buffer policy allocating {} units", self.preferred_size);
            vec![Ch::NUL; self.preferred_size]
        }))
    }

    fn release_buffer(&mut self, _handler: &mut H, buffer: Vec<Ch>) {
        self.spare = Some(buffer);
    }
}

/// Delegates buffer management entirely to the handler, which must
/// implement [`BufferOwner`]. Used when the handler wants to own its
/// buffers directly, e.g. the stored-table builder folding a field's
/// buffer straight into its arena.
pub struct PassThroughPolicy;

impl PassThroughPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PassThroughPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ch: CodeUnit, H: BufferOwner<Ch> + ?Sized> BufferPolicy<Ch, H> for PassThroughPolicy {
    fn get_buffer(&mut self, handler: &mut H) -> Result<Vec<Ch>, ParseError> {
        handler.get_buffer()
    }

    fn release_buffer(&mut self, handler: &mut H, buffer: Vec<Ch>) {
        handler.release_buffer(buffer)
    }
}
