// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Declarative macro for request structs

/// Declare a struct that rule tags can address
///
/// Each field is written `name: Type`, optionally followed by `=> "Name"` to
/// set the name used in field paths (defaults to the Rust field name), and
/// optionally preceded by `#[rule = "..."]` to attach an expression.
///
/// Field types must implement [`AsField`](crate::AsField); nested structs
/// declared with this macro do automatically.
///
/// ```
/// use fieldrule::record;
///
/// record! {
///     #[derive(Debug, Default)]
///     pub struct PathParams {
///         pub user_id: String => "UserID",
///     }
/// }
///
/// record! {
///     #[derive(Debug, Default)]
///     pub struct Item {
///         #[rule = "owned_by($.Path.UserID)"]
///         pub owner: String => "Owner",
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (@name $field:ident) => {
        stringify!($field)
    };
    (@name $field:ident $external:literal) => {
        $external
    };
    (@rule) => {
        ::core::option::Option::None
    };
    (@rule $rule:literal) => {
        ::core::option::Option::Some($rule)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[rule = $rule:literal])?
                $fvis:vis $field:ident : $fty:ty $(=> $external:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fvis $field: $fty,)*
        }

        impl $crate::Record for $name {
            fn describe() -> &'static $crate::Schema {
                static SCHEMA: $crate::Schema = $crate::Schema {
                    name: stringify!($name),
                    fields: &[
                        $(
                            $crate::FieldDef {
                                name: $crate::record!(@name $field $($external)?),
                                rule: $crate::record!(@rule $($rule)?),
                                shape: <$fty as $crate::AsField>::shape,
                            },
                        )*
                    ],
                };
                &SCHEMA
            }

            fn schema(&self) -> &'static $crate::Schema {
                <Self as $crate::Record>::describe()
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field(&self, index: usize) -> $crate::Value<'_> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::AsField::as_field(&self.$field);
                    }
                    position += 1;
                )*
                $crate::Value::Null
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }

        impl $crate::AsField for $name {
            fn shape() -> $crate::Shape {
                $crate::Shape::Record(<Self as $crate::Record>::describe())
            }

            fn as_field(&self) -> $crate::Value<'_> {
                $crate::Value::Record(self)
            }
        }
    };
}
