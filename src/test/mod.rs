mod api;
mod matches;
mod teams;
