use crate::{
    error::Error,
    schema::{Recipe, User, UserRole},
};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageCatalog,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnShoppingCart,
    ManageOwnSubscriptions,

    ManageAllRecipes,
    ManageCatalog,
}

impl ActionType {
    pub fn authenticate(self, role: &UserRole) -> bool {
        ACTION_TABLE
            .iter()
            .find_map(|(r, actions)| {
                if role != r {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

fn forbidden() -> Error {
    Error::Forbidden("You do not have permission to perform this action.".to_owned())
}

impl User {
    /// Checks the stored role, never the one signed into the session.
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(&self.role) {
            return Err(forbidden());
        }
        Ok(())
    }
}

/// Object-level check for recipe mutation: the author, or anyone allowed
/// to manage every recipe.
pub fn can_manage_recipe(user: &User, recipe: &Recipe) -> bool {
    if recipe.author_id == user.id {
        return ActionType::ManageOwnRecipes.authenticate(&user.role);
    }
    ActionType::ManageAllRecipes.authenticate(&user.role)
}

pub fn authorize_recipe(user: &User, recipe: &Recipe) -> Result<(), Error> {
    if !can_manage_recipe(user, recipe) {
        return Err(forbidden());
    }
    Ok(())
}
