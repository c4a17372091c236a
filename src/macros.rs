// ============================================================================
// spark-observe - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// Object and array handles are cheap to clone; this saves the
/// `let x = x.clone();` lines before every watcher closure.
///
/// # Usage
///
/// ```rust
/// use spark_observe::{cloned, observe, watcher, Object, Value};
///
/// let data = Object::from_iter([("a", 1)]);
/// observe(&Value::from(data.clone()), false).unwrap();
///
/// let w = watcher(cloned!(data => move || {
///     data.get("a");
/// }));
/// data.set("a", 2);
/// assert_eq!(w.run_count(), 2);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Declare a fixed-shape struct whose fields are reactive.
///
/// Every field becomes a private [`Field<T>`](crate::Field) with an accessor
/// method of the same name, and `new` takes the initial values in order.
///
/// # Usage
///
/// ```rust
/// use spark_observe::{reactive_struct, watcher};
/// use std::rc::Rc;
///
/// reactive_struct! {
///     pub struct Todo {
///         pub title: String,
///         pub done: bool,
///     }
/// }
///
/// let todo = Rc::new(Todo::new("write docs".into(), false));
/// let w = watcher({
///     let todo = todo.clone();
///     move || {
///         todo.done().get();
///     }
/// });
///
/// todo.title().set("write more docs".into());
/// assert_eq!(w.run_count(), 1);
/// todo.done().set(true);
/// assert_eq!(w.run_count(), 2);
/// ```
#[macro_export]
macro_rules! reactive_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $field: $crate::Field<$ty>, )*
        }

        impl $name {
            #[allow(clippy::too_many_arguments)]
            $vis fn new($( $field: $ty ),*) -> Self {
                Self {
                    $( $field: $crate::Field::new($field), )*
                }
            }

            $(
                $(#[$field_meta])*
                $field_vis fn $field(&self) -> &$crate::Field<$ty> {
                    &self.$field
                }
            )*
        }
    };
}
