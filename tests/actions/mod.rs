mod catalog;
mod relations;
mod shopping_list;
mod subscriptions;
mod users;
