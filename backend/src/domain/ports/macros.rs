//! Generates the error enums returned by domain ports.
//!
//! Each variant carries string context fields and gets a snake_case
//! constructor taking `impl Into<String>` for every field, e.g.
//! `UserRepositoryError::storage("disk full")`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident),+ $(,)? } )? => $message:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field: String),+ } )?,
            )+
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = "Construct [`" $name "::" $variant "`]."]
                    pub fn [<$variant:snake>]($( $($field: impl Into<String>),+ )?) -> Self {
                        Self::$variant $( { $($field: $field.into()),+ } )?
                    }
                }
            )+
        }
    };
}

pub(crate) use define_port_error;
