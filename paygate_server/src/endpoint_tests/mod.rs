mod admin;
mod helpers;
mod jobs;
mod mocks;
mod orders;
mod webhooks;
