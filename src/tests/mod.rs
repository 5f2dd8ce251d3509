mod helper;
mod permissions;
