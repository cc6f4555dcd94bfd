//! Scope frames for the evaluator.
//!
//! All frames of a session live in one arena. Frames point at their outer
//! frame, and closures at the frame they captured, by `FrameId`, so no frame
//! owns another and a closure bound in its own frame is not a reference
//! cycle. A frame is freed as soon as no handle, inner frame or closure can
//! refer to it; frames that closures captured are left to `collect`. The
//! whole arena goes when the last handle is dropped.

use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

#[derive(Default)]
struct Frame {
    store: HashMap<String, Object>,
    outer: Option<FrameId>,
    /// Live `Environment` handles on this frame.
    handles: usize,
    /// Frames whose `outer` is this one.
    children: usize,
    /// Set once a function literal closes over this frame.
    captured: bool,
}

impl Frame {
    fn is_unreferenced(&self) -> bool {
        self.handles == 0 && self.children == 0 && !self.captured
    }
}

#[derive(Default)]
struct Heap {
    frames: Vec<Option<Frame>>,
    free: Vec<usize>,
}

impl Heap {
    fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.0).and_then(Option::as_ref)
    }

    fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id.0).and_then(Option::as_mut)
    }

    /// A new frame with one handle on it.
    fn alloc(&mut self, outer: Option<FrameId>) -> FrameId {
        if let Some(frame) = outer.and_then(|id| self.frame_mut(id)) {
            frame.children += 1;
        }

        let frame = Frame {
            outer,
            handles: 1,
            ..Default::default()
        };
        match self.free.pop() {
            Some(slot) => {
                self.frames[slot] = Some(frame);
                FrameId(slot)
            }
            None => {
                self.frames.push(Some(frame));
                FrameId(self.frames.len() - 1)
            }
        }
    }

    fn take(&mut self, id: FrameId) -> Option<Frame> {
        let frame = self.frames.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        Some(frame)
    }

    /// Frees `id` if nothing refers to it, then walks outward doing the same
    /// for each frame that loses its last inner frame.
    fn release(&mut self, id: FrameId) {
        let mut next = Some(id);

        while let Some(id) = next.take() {
            match self.frame(id) {
                Some(frame) if frame.is_unreferenced() => {}
                _ => return,
            }

            let outer = self.take(id).and_then(|frame| frame.outer);
            if let Some(outer) = outer {
                if let Some(frame) = self.frame_mut(outer) {
                    frame.children -= 1;
                    next = Some(outer);
                }
            }
        }
    }
}

fn push_captured(value: &Object, pending: &mut Vec<FrameId>) {
    match value {
        Object::Function(func) => pending.push(func.env),
        Object::ReturnValue(inner) => push_captured(inner, pending),
        Object::Builtin(_)
        | Object::Integer(_)
        | Object::Boolean(_)
        | Object::String(_)
        | Object::Null => {}
    }
}

/// Handle to one scope frame. Cloning the handle shares the frame.
pub struct Environment {
    heap: Rc<RefCell<Heap>>,
    frame: FrameId,
}

impl Environment {
    pub fn new() -> Self {
        let mut heap = Heap::default();
        let frame = heap.alloc(None);

        Self {
            heap: Rc::new(RefCell::new(heap)),
            frame,
        }
    }

    /// A fresh, empty frame whose lookups fall back to `outer`.
    pub fn with_enclosed(outer: &Environment) -> Self {
        outer.enclose(outer.frame)
    }

    /// A fresh, empty frame in this session whose lookups fall back to the
    /// frame `outer`, typically one a closure captured.
    pub fn enclose(&self, outer: FrameId) -> Self {
        let frame = self.heap.borrow_mut().alloc(Some(outer));

        Self {
            heap: Rc::clone(&self.heap),
            frame,
        }
    }

    /// Id of this frame for a closure to keep. The frame then outlives its
    /// handles until `collect` finds it unreachable.
    pub fn capture(&self) -> FrameId {
        if let Some(frame) = self.heap.borrow_mut().frame_mut(self.frame) {
            frame.captured = true;
        }
        self.frame
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        let heap = self.heap.borrow();
        let mut next = Some(self.frame);

        while let Some(id) = next {
            let frame = heap.frame(id)?;
            if let Some(obj) = frame.store.get(name) {
                return Some(obj.clone());
            }
            next = frame.outer;
        }

        None
    }

    /// Binds in this frame only; an outer binding of the same name is
    /// shadowed, never overwritten.
    pub fn set(&self, name: &str, val: Object) {
        if let Some(frame) = self.heap.borrow_mut().frame_mut(self.frame) {
            frame.store.insert(name.to_owned(), val);
        }
    }

    /// Frees every frame that is unreachable from a live handle or from
    /// `values`, and returns how many were freed.
    ///
    /// A closure held anywhere else is not seen, so its frame may be reused
    /// afterwards. Only call this between evaluations, with whatever value
    /// the caller still holds in `values`.
    pub fn collect<'a>(&self, values: impl IntoIterator<Item = &'a Object>) -> usize {
        let mut heap = self.heap.borrow_mut();

        let mut pending: Vec<FrameId> = heap
            .frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.as_ref().map_or(false, |frame| frame.handles > 0))
            .map(|(slot, _)| FrameId(slot))
            .collect();
        for value in values {
            push_captured(value, &mut pending);
        }

        let mut marked = vec![false; heap.frames.len()];
        while let Some(id) = pending.pop() {
            match marked.get_mut(id.0) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            if let Some(frame) = heap.frame(id) {
                pending.extend(frame.outer);
                for value in frame.store.values() {
                    push_captured(value, &mut pending);
                }
            }
        }

        let mut garbage = vec![];
        for (slot, seen) in marked.into_iter().enumerate() {
            if !seen {
                garbage.extend(heap.take(FrameId(slot)));
            }
        }
        for frame in garbage.iter() {
            if let Some(outer) = frame.outer.and_then(|id| heap.frame_mut(id)) {
                outer.children -= 1;
            }
        }

        garbage.len()
    }

    /// Frames currently allocated in this session.
    pub fn live_frames(&self) -> usize {
        let heap = self.heap.borrow();
        heap.frames.len() - heap.free.len()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Environment {
    fn clone(&self) -> Self {
        if let Some(frame) = self.heap.borrow_mut().frame_mut(self.frame) {
            frame.handles += 1;
        }

        Self {
            heap: Rc::clone(&self.heap),
            frame: self.frame,
        }
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        let mut heap = self.heap.borrow_mut();
        if let Some(frame) = heap.frame_mut(self.frame) {
            frame.handles -= 1;
        }
        heap.release(self.frame);
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let heap = self.heap.borrow();
        let mut names: Vec<&String> = heap
            .frame(self.frame)
            .map(|frame| frame.store.keys().collect())
            .unwrap_or_default();
        names.sort();

        f.debug_struct("Environment")
            .field("frame", &self.frame)
            .field("names", &names)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::BlockStatement;
    use crate::object::FunctionObject;
    use crate::token::Token;

    fn closure_over(env: &Environment) -> Rc<FunctionObject> {
        Rc::new(FunctionObject {
            parameters: vec![],
            body: Rc::new(BlockStatement {
                token: Token::LBrace,
                statements: vec![],
            }),
            env: env.capture(),
        })
    }

    #[test]
    fn test_get_and_set() {
        let env = Environment::new();
        assert_eq!(env.get("x"), None);

        env.set("x", Object::Integer(5));
        assert_eq!(env.get("x"), Some(Object::Integer(5)));
    }

    #[test]
    fn test_lookup_falls_back_to_outer() {
        let outer = Environment::new();
        outer.set("x", Object::Integer(1));
        let inner = Environment::with_enclosed(&outer);

        assert_eq!(inner.get("x"), Some(Object::Integer(1)));

        outer.set("y", Object::Integer(2));
        assert_eq!(inner.get("y"), Some(Object::Integer(2)));
    }

    #[test]
    fn test_inner_binding_shadows_without_mutating_outer() {
        let outer = Environment::new();
        outer.set("x", Object::Integer(1));
        let inner = Environment::with_enclosed(&outer);
        inner.set("x", Object::Integer(2));

        assert_eq!(inner.get("x"), Some(Object::Integer(2)));
        assert_eq!(outer.get("x"), Some(Object::Integer(1)));
    }

    #[test]
    fn test_clones_share_the_frame() {
        let env = Environment::new();
        let handle = env.clone();
        handle.set("shared", true.into());

        assert_eq!(env.get("shared"), Some(true.into()));
    }

    #[test]
    fn test_outer_frame_outlives_its_handle_while_inner_lives() {
        let outer = Environment::new();
        outer.set("x", Object::Integer(1));
        let inner = Environment::with_enclosed(&outer);
        drop(outer);

        assert_eq!(inner.get("x"), Some(Object::Integer(1)));
        assert_eq!(inner.live_frames(), 2);
    }

    #[test]
    fn test_uncaptured_frame_is_freed_with_its_handle() {
        let env = Environment::new();
        let call = Environment::with_enclosed(&env);
        call.set("n", Object::Integer(3));
        assert_eq!(env.live_frames(), 2);

        drop(call);
        assert_eq!(env.live_frames(), 1);
    }

    #[test]
    fn test_self_capturing_closure_is_freed_with_the_session() {
        let env = Environment::new();
        let func = closure_over(&env);
        let weak_func = Rc::downgrade(&func);
        env.set("f", Object::Function(func));
        let weak_heap = Rc::downgrade(&env.heap);

        drop(env);
        assert!(weak_heap.upgrade().is_none());
        assert!(weak_func.upgrade().is_none());
    }

    #[test]
    fn test_collect_frees_unreachable_captured_frames() {
        let env = Environment::new();
        let call = Environment::with_enclosed(&env);
        let local = closure_over(&call);
        let weak_local = Rc::downgrade(&local);
        call.set("g", Object::Function(local));
        drop(call);

        // Still captured, so only the collector can free it.
        assert_eq!(env.live_frames(), 2);
        assert_eq!(env.collect(None), 1);
        assert_eq!(env.live_frames(), 1);
        assert!(weak_local.upgrade().is_none());
    }

    #[test]
    fn test_collect_keeps_frames_reachable_from_bindings_and_values() {
        let env = Environment::new();

        let call = Environment::with_enclosed(&env);
        call.set("x", Object::Integer(2));
        let bound = Object::Function(closure_over(&call));
        drop(call);
        env.set("add", bound);

        let call = Environment::with_enclosed(&env);
        let held = Object::Function(closure_over(&call));
        drop(call);

        assert_eq!(env.collect(Some(&held)), 0);
        assert_eq!(env.live_frames(), 3);

        env.set("add", Object::Null);
        assert_eq!(env.collect(None), 2);
        assert_eq!(env.live_frames(), 1);
    }
}
