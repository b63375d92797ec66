mod others;
mod property;
