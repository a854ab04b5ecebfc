//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::NamedKey;

// Thread-local resolution state for circular dependency detection
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

struct Frame {
    container: u64,
    key: NamedKey,
}

/// Marks one key as being resolved on the current thread.
///
/// Frames are scoped per container, so one container resolving through
/// another is never mistaken for a cycle.
pub(crate) struct ResolutionGuard {
    container: u64,
}

impl ResolutionGuard {
    /// Pushes `key`, failing if it is already on this container's chain or if
    /// the chain is `max_depth` deep.
    pub(crate) fn enter(container: u64, key: &NamedKey, max_depth: usize) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let chain = || stack.iter().filter(|f| f.container == container);

            if chain().any(|f| &f.key == key) {
                let mut path: Vec<&'static str> = chain()
                    .skip_while(|f| &f.key != key)
                    .map(|f| f.key.type_name())
                    .collect();
                path.push(key.type_name());
                return Err(DiError::Circular(path));
            }

            if chain().count() >= max_depth {
                return Err(DiError::DepthExceeded(max_depth));
            }

            stack.push(Frame {
                container,
                key: key.clone(),
            });
            Ok(Self { container })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|f| f.container == self.container) {
                stack.remove(pos);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ServiceType;

    struct A;
    struct B;

    #[test]
    fn reports_cycle_path_from_first_occurrence() {
        let a = NamedKey::unnamed(&ServiceType::registered::<A>());
        let b = NamedKey::unnamed(&ServiceType::registered::<B>());

        let _a = ResolutionGuard::enter(1, &a, 16).unwrap();
        let _b = ResolutionGuard::enter(1, &b, 16).unwrap();
        let err = ResolutionGuard::enter(1, &a, 16).err().unwrap();

        match err {
            DiError::Circular(path) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].ends_with("::A"));
                assert!(path[1].ends_with("::B"));
                assert!(path[2].ends_with("::A"));
            }
            other => panic!("expected Circular, got {other:?}"),
        }
    }

    #[test]
    fn containers_do_not_share_chains() {
        let a = NamedKey::unnamed(&ServiceType::registered::<A>());
        let _outer = ResolutionGuard::enter(10, &a, 16).unwrap();
        assert!(ResolutionGuard::enter(11, &a, 16).is_ok());
    }

    #[test]
    fn names_distinguish_frames() {
        let ty = ServiceType::registered::<A>();
        let _plain = ResolutionGuard::enter(20, &NamedKey::unnamed(&ty), 16).unwrap();
        assert!(ResolutionGuard::enter(20, &NamedKey::new(&ty, "inner"), 16).is_ok());
    }

    #[test]
    fn depth_is_bounded() {
        let a = NamedKey::unnamed(&ServiceType::registered::<A>());
        let b = NamedKey::unnamed(&ServiceType::registered::<B>());
        let _a = ResolutionGuard::enter(30, &a, 1).unwrap();
        assert_eq!(
            ResolutionGuard::enter(30, &b, 1).err(),
            Some(DiError::DepthExceeded(1))
        );
    }

    #[test]
    fn frames_pop_on_drop() {
        let a = NamedKey::unnamed(&ServiceType::registered::<A>());
        {
            let _a = ResolutionGuard::enter(40, &a, 16).unwrap();
        }
        assert!(ResolutionGuard::enter(40, &a, 16).is_ok());
    }
}
