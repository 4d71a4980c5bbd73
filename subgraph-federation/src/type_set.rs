use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::schema::ExtendedType;

/// An ordered, immutable selection of named types borrowed from a schema.
///
/// Filtering never changes the receiver: every call to [`TypeSet::filter`] produces a new set
/// holding the surviving entries in their original order.
#[derive(Clone, Debug, Default)]
pub struct TypeSet<'schema> {
    types: IndexMap<&'schema Name, &'schema ExtendedType>,
}

impl<'schema> TypeSet<'schema> {
    pub fn new(types: impl IntoIterator<Item = (&'schema Name, &'schema ExtendedType)>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    /// Every named type of the schema, built-in types included, in type map order.
    pub fn from_schema(schema: &'schema Schema) -> Self {
        Self::new(&schema.types)
    }

    pub fn filter(&self, predicate: impl Fn(&ExtendedType) -> bool) -> Self {
        Self {
            types: self
                .types
                .iter()
                .filter(|(_, ty)| predicate(**ty))
                .map(|(name, ty)| (*name, *ty))
                .collect(),
        }
    }

    pub fn has_types(&self) -> bool {
        !self.types.is_empty()
    }

    pub fn type_names(&self) -> Vec<Name> {
        self.types.keys().map(|name| (*name).clone()).collect()
    }

    pub fn to_vec(&self) -> Vec<&'schema ExtendedType> {
        self.types.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'schema Name, &'schema ExtendedType)> + '_ {
        self.types.iter().map(|(name, ty)| (*name, *ty))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::Schema;
    use apollo_compiler::name;

    use super::*;

    fn schema() -> Schema {
        Schema::parse(
            r#"
            type Query {
                user: User
            }

            type User {
                id: ID!
            }
            "#,
            "schema.graphql",
        )
        .expect("valid schema")
    }

    fn user_and_string(schema: &Schema) -> TypeSet<'_> {
        TypeSet::new(
            ["User", "String"]
                .into_iter()
                .filter_map(|name| schema.types.get_key_value(name)),
        )
    }

    #[test]
    fn it_should_filter_types() {
        let schema = schema();
        let type_set = user_and_string(&schema);

        let result = type_set.filter(|ty| ty.name().as_str() == "User");

        assert_eq!(result.to_vec().len(), 1);
        assert_eq!(type_set.len(), 2, "filtering leaves the receiver untouched");
    }

    #[test]
    fn it_should_return_whether_it_has_any_types() {
        assert!(!TypeSet::default().has_types());

        let schema = schema();
        let type_set = user_and_string(&schema);
        assert!(type_set.has_types());
        assert!(!type_set.filter(|_| false).has_types());
    }

    #[test]
    fn it_should_return_a_list_of_type_names() {
        let schema = schema();
        let type_set = user_and_string(&schema);

        assert_eq!(type_set.type_names(), [name!("User"), name!("String")]);
    }

    #[test]
    fn it_should_be_represented_as_a_vec() {
        let schema = schema();
        let type_set = user_and_string(&schema);

        let types = type_set.to_vec();
        assert_eq!(types.len(), 2);
        assert!(matches!(types[0], ExtendedType::Object(_)));
        assert!(matches!(types[1], ExtendedType::Scalar(_)));
    }

    #[test]
    fn filtering_twice_matches_filtering_by_the_conjunction() {
        let schema = schema();
        let type_set = TypeSet::from_schema(&schema);
        let is_object = |ty: &ExtendedType| matches!(ty, ExtendedType::Object(_));
        let is_user_defined = |ty: &ExtendedType| !ty.is_built_in();

        let chained = type_set.filter(is_object).filter(is_user_defined);
        let conjunction = type_set.filter(|ty| is_object(ty) && is_user_defined(ty));

        assert_eq!(chained.type_names(), conjunction.type_names());
        assert_eq!(chained.type_names(), [name!("Query"), name!("User")]);
    }
}
